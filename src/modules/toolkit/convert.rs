//! Unit conversion: wei/gwei/ether over 256-bit values

use anyhow::{anyhow, bail, Context};

use super::ToolResult;
use crate::domain::abi::Uint256;

/// Decimal digits in 2^256 - 1
const MAX_UINT256_DIGITS: i64 = 78;

/// Parse a value with optional unit and convert to all units
pub fn convert(value: &str, unit: Option<&str>) -> anyhow::Result<ToolResult> {
    let value = value.trim();
    if value.is_empty() {
        bail!("usage: convert <value> [unit]");
    }
    let unit = unit.map(str::to_lowercase).unwrap_or_else(|| "wei".to_string());

    let wei = parse_to_wei(value, &unit)?;
    Ok(ToolResult::new("Convert")
        .add("wei", group_thousands(&wei.dec()))
        .add("gwei", format_units(&wei, 9))
        .add("ether", format_units(&wei, 18))
        .add("hex", wei.min_hex()))
}

fn unit_decimals(unit: &str) -> anyhow::Result<u32> {
    Ok(match unit {
        "wei" => 0,
        "kwei" | "babbage" => 3,
        "mwei" | "lovelace" => 6,
        "gwei" | "shannon" => 9,
        "szabo" | "microether" => 12,
        "finney" | "milliether" => 15,
        "ether" | "eth" => 18,
        _ => bail!("unknown unit: {}", unit),
    })
}

/// Exact conversion of a decimal (or `0x` hex wei) value to wei
fn parse_to_wei(value: &str, unit: &str) -> anyhow::Result<Uint256> {
    if value.starts_with("0x") || value.starts_with("0X") {
        if unit != "wei" {
            bail!("hex values are always wei");
        }
        return Uint256::from_hex(value).with_context(|| format!("invalid hex value {:?}", value));
    }

    let digits = scale_decimal(value, unit_decimals(unit)? as i64)?;
    let wei = Uint256::from_dec(&digits).with_context(|| format!("invalid number {:?}", value))?;
    if wei.dec() != digits {
        bail!("value {} does not fit in 256 bits", value);
    }
    Ok(wei)
}

/// Shift `value` (optionally in `1.5e3` notation) left by `decimals`
/// digits, returning the integer digit string
fn scale_decimal(value: &str, decimals: i64) -> anyhow::Result<String> {
    let invalid = || anyhow!("invalid number: {}", value);
    let (mantissa, exponent) = match value.find(['e', 'E']) {
        Some(pos) => {
            let exp: i64 = value[pos + 1..].parse().map_err(|_| invalid())?;
            (&value[..pos], exp)
        }
        None => (value, 0),
    };
    let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if integer.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !integer.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let shift = decimals.checked_add(exponent).ok_or_else(invalid)?;
    let fraction = fraction.trim_end_matches('0');
    if shift < fraction.len() as i64 {
        bail!("too many decimal places for unit");
    }
    let significant = format!("{}{}", integer, fraction);
    let significant = significant.trim_start_matches('0');
    if significant.is_empty() {
        return Ok("0".to_string());
    }
    let padding = shift - fraction.len() as i64;
    if significant.len() as i64 + padding > MAX_UINT256_DIGITS {
        bail!("value {} does not fit in 256 bits", value);
    }
    Ok(format!("{}{}", significant, "0".repeat(padding as usize)))
}

/// Place a decimal point `decimals` digits from the right, trimming zeros
fn format_units(wei: &Uint256, decimals: usize) -> String {
    let digits = wei.dec();
    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (integer, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        group_thousands(integer)
    } else {
        format!("{}.{}", group_thousands(integer), fraction)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut result = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
