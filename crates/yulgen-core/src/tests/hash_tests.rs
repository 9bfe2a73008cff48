use crate::hash::{keccak256, selector, to_hex};

#[test]
fn test_keccak_of_empty_input() {
    assert_eq!(
        to_hex(&keccak256(b"")),
        "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
    );
}

#[test]
fn test_erc20_transfer_selector() {
    assert_eq!(selector("transfer(address,uint256)"), 0xa9059cbb);
    assert_eq!(selector("balanceOf(address)"), 0x70a08231);
}
