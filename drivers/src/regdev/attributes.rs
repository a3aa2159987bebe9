//! Attribute dispatch.
//!
//! Each attribute file is bound to one register (or to a register pair
//! forming a 64-bit value) and exchanges its value as text: `show` renders
//! decimal with a trailing newline, `store` accepts what `%i` accepts.

use super::instance::DeviceInstance;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use common::{Errno, KResult};
use kernel::device::{AttrMode, AttributeOps, DeviceAttribute};

/// Where an attribute's value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrSource {
    /// A single register, by name.
    Register(&'static str),
    /// `(high << 32) | low`, read-only.
    Wide {
        low: &'static str,
        high: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub attr: DeviceAttribute,
    pub source: AttrSource,
}

impl AttributeSpec {
    pub const fn register(name: &'static str, mode: AttrMode, reg: &'static str) -> Self {
        Self {
            attr: DeviceAttribute::new(name, mode),
            source: AttrSource::Register(reg),
        }
    }

    pub const fn wide(name: &'static str, low: &'static str, high: &'static str) -> Self {
        Self {
            attr: DeviceAttribute::new(name, AttrMode::RO),
            source: AttrSource::Wide { low, high },
        }
    }
}

/// Parse an unsigned integer the way `%i` does: `0x` hex, leading `0`
/// octal, decimal otherwise. Surrounding whitespace is ignored.
pub fn parse_int(text: &str) -> KResult<u64> {
    let text = text.trim();
    let text = text.strip_prefix('+').unwrap_or(text);
    let (digits, radix) = if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        (hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };
    // from_str_radix takes its own sign, which %i would not after a prefix
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(Errno::Inval);
    }
    u64::from_str_radix(digits, radix).map_err(|_| Errno::Inval)
}

pub(crate) struct RegisterAttribute {
    instance: Arc<DeviceInstance>,
    source: AttrSource,
}

impl RegisterAttribute {
    pub(crate) fn new(instance: Arc<DeviceInstance>, source: AttrSource) -> Self {
        Self { instance, source }
    }

    fn read_named(&self, name: &str) -> KResult<u32> {
        let reg = self.instance.map().by_name(name).ok_or(Errno::Inval)?;
        self.instance.read(reg)
    }
}

impl AttributeOps for RegisterAttribute {
    fn show(&self, _attr: &DeviceAttribute) -> KResult<String> {
        let value = match self.source {
            AttrSource::Register(name) => self.read_named(name)? as u64,
            AttrSource::Wide { low, high } => {
                let high = self.read_named(high)? as u64;
                let low = self.read_named(low)? as u64;
                (high << 32) | low
            }
        };
        Ok(format!("{}\n", value))
    }

    fn store(&self, _attr: &DeviceAttribute, buf: &str) -> KResult<usize> {
        let AttrSource::Register(name) = self.source else {
            return Err(Errno::NotSupported);
        };
        let reg = self.instance.map().by_name(name).ok_or(Errno::Inval)?;
        let value = parse_int(buf)?;
        if value > reg.width.max_value() as u64 {
            return Err(Errno::Inval);
        }
        self.instance.write(reg, value as u32)?;
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_follows_percent_i() {
        assert_eq!(parse_int("42\n"), Ok(42));
        assert_eq!(parse_int("0x1F"), Ok(31));
        assert_eq!(parse_int("017"), Ok(15));
        assert_eq!(parse_int("0"), Ok(0));
        assert_eq!(parse_int("+8"), Ok(8));
        assert_eq!(parse_int("abc"), Err(Errno::Inval));
        assert_eq!(parse_int(""), Err(Errno::Inval));
        assert_eq!(parse_int("-1"), Err(Errno::Inval));
        for bad in ["0x+5", "0x-5", "++5", "+-5", "0+7", "0x"] {
            assert_eq!(parse_int(bad), Err(Errno::Inval), "{}", bad);
        }
    }
}
