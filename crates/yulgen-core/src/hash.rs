use num_bigint::BigUint;
use tiny_keccak::{Hasher, Keccak};

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Keccak-256 of `data` read as a big-endian 256-bit number.
pub fn keccak256_number(data: &[u8]) -> BigUint {
    BigUint::from_bytes_be(&keccak256(data))
}

/// First four bytes of the keccak-256 of an external signature such as `transfer(address,uint256)`.
pub fn selector(signature: &str) -> u32 {
    let hash = keccak256(signature.as_bytes());
    u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]])
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
