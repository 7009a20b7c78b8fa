//! Ethereum address checksum (EIP-55)

use anyhow::Context;

use super::ToolResult;
use crate::domain::abi::{parse_address, to_checksum_address};

/// Convert address to checksummed format
pub fn checksum(input: &str) -> anyhow::Result<ToolResult> {
    let input = input.trim();
    parse_address(input).with_context(|| format!("invalid address {:?}", input))?;

    let checksummed = to_checksum_address(input);
    let status = match checksum_status(input, &checksummed) {
        Status::Valid => "valid checksum",
        Status::Unchecked => "no checksum (single case)",
        Status::Invalid => "checksum mismatch",
    };

    Ok(ToolResult::new("Checksum")
        .add("address", &checksummed)
        .add("input", status))
}

#[derive(Debug, PartialEq, Eq)]
enum Status {
    Valid,
    Unchecked,
    Invalid,
}

fn checksum_status(input: &str, checksummed: &str) -> Status {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    if digits == &checksummed[2..] {
        Status::Valid
    } else if digits == digits.to_lowercase() || digits == digits.to_uppercase() {
        Status::Unchecked
    } else {
        Status::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum() {
        let result = checksum("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359").unwrap();
        assert_eq!(
            result.get("address"),
            Some("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359")
        );
        assert_eq!(result.get("input"), Some("no checksum (single case)"));
    }

    #[test]
    fn test_checksum_status() {
        let good = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
        assert_eq!(checksum_status(good, good), Status::Valid);
        assert_eq!(
            checksum_status("0xFb6916095ca1df60bB79Ce92cE3Ea74c37c5d359", good),
            Status::Invalid
        );
    }

    #[test]
    fn test_checksum_rejects_bad_input() {
        assert!(checksum("0x1234").is_err());
        assert!(checksum("0xzz6916095ca1df60bb79ce92ce3ea74c37c5d359").is_err());
    }
}
