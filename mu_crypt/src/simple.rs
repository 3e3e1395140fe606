//! Running-key XOR cipher used by map files and early model revisions.

const XOR_KEY: [u8; 16] = [
    0xD1, 0x73, 0x52, 0xF6, 0xD2, 0x9A, 0xCB, 0x27, 0x3E, 0xAF, 0x59, 0x31, 0x37, 0xB3, 0xE7, 0xA2,
];

const INITIAL_KEY: u8 = 0x5E;
const KEY_STEP: u8 = 0x3D;

pub fn decrypt(bytes: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;

    bytes
        .iter()
        .zip(XOR_KEY.iter().cycle())
        .map(|(&encrypted, &xor)| {
            let plain = (encrypted ^ xor).wrapping_sub(key);
            key = encrypted.wrapping_add(KEY_STEP);
            plain
        })
        .collect()
}

pub fn encrypt(bytes: &[u8]) -> Vec<u8> {
    let mut key = INITIAL_KEY;

    bytes
        .iter()
        .zip(XOR_KEY.iter().cycle())
        .map(|(&plain, &xor)| {
            let encrypted = plain.wrapping_add(key) ^ xor;
            key = encrypted.wrapping_add(KEY_STEP);
            encrypted
        })
        .collect()
}
