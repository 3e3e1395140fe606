//! LEA-256 block cipher in ECB mode.

use lea::{
    prelude::{BlockDecrypt, BlockEncrypt, GenericArray, NewBlockCipher},
    Lea256,
};

const BLOCK_SIZE: usize = 16;

const KEY: [u8; 32] = [
    0xcc, 0x50, 0x45, 0x13, 0xc2, 0xa6, 0x57, 0x4e, 0xd6, 0x9a, 0x45, 0x89, 0xbf, 0x2f, 0xbc, 0xd9,
    0x39, 0xb3, 0xb3, 0xbd, 0x50, 0xbd, 0xcc, 0xb6, 0x85, 0x46, 0xd1, 0xd6, 0x16, 0x54, 0xe0, 0x87,
];

fn cipher() -> Lea256 {
    Lea256::new(GenericArray::from_slice(&KEY))
}

// A trailing partial block is left as is.
pub fn decrypt(bytes: &[u8]) -> Vec<u8> {
    let cipher = cipher();
    let mut out = bytes.to_vec();

    for block in out.chunks_exact_mut(BLOCK_SIZE) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }

    out
}

pub fn encrypt(bytes: &[u8]) -> Vec<u8> {
    let cipher = cipher();
    let mut out = bytes.to_vec();

    for block in out.chunks_exact_mut(BLOCK_SIZE) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }

    out
}
