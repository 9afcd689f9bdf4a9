//! Software-accessible registers and the register map compiler.
//!
//! Registers are placed by a running word cursor in group order, then
//! declaration order. A register occupies
//! `ceil(width / data_width) * 2^log2_items` words and starts at an address
//! aligned to that footprint rounded up to a power of two.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Result};
use crate::expr::Expr;
use crate::param::{eval_error, ResolvedParameters};

/// Software access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Access {
    #[serde(alias = "R")]
    ReadOnly,
    #[serde(alias = "W")]
    WriteOnly,
    #[serde(alias = "RW")]
    ReadWrite,
}

impl Access {
    pub fn is_readable(self) -> bool {
        matches!(self, Access::ReadOnly | Access::ReadWrite)
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Access::WriteOnly | Access::ReadWrite)
    }

    /// Short code used in listings.
    pub fn code(self) -> &'static str {
        match self {
            Access::ReadOnly => "R",
            Access::WriteOnly => "W",
            Access::ReadWrite => "RW",
        }
    }
}

fn default_autoreg() -> bool {
    true
}

/// A register declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    pub name: String,
    pub access: Access,
    /// Bit width; a literal or a parameter expression.
    pub width: Expr,
    #[serde(default)]
    pub reset: u64,
    /// Array dimension exponent; 0 declares a scalar.
    #[serde(default)]
    pub log2_items: u32,
    /// Whether the emitter synthesizes the read/write logic.
    #[serde(default = "default_autoreg")]
    pub autoreg: bool,
    #[serde(default)]
    pub description: String,
}

impl Register {
    pub fn new(name: &str, access: Access, width: Expr) -> Self {
        Register {
            name: name.to_string(),
            access,
            width,
            reset: 0,
            log2_items: 0,
            autoreg: true,
            description: String::new(),
        }
    }

    pub fn with_reset(mut self, reset: u64) -> Self {
        self.reset = reset;
        self
    }

    pub fn with_items_log2(mut self, log2_items: u32) -> Self {
        self.log2_items = log2_items;
        self
    }

    pub fn with_autoreg(mut self, autoreg: bool) -> Self {
        self.autoreg = autoreg;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
}

/// A named, ordered group of registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterGroup {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub registers: Vec<Register>,
}

impl RegisterGroup {
    pub fn new(name: &str, description: &str, registers: Vec<Register>) -> Self {
        RegisterGroup {
            name: name.to_string(),
            description: description.to_string(),
            registers,
        }
    }
}

/// A placed register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterEntry {
    pub group: String,
    pub name: String,
    pub access: Access,
    pub width: u64,
    pub reset: u64,
    pub log2_items: u32,
    pub autoreg: bool,
    pub description: String,
    /// First word address.
    pub address: u64,
    /// First byte address, when the data width is a whole number of bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_address: Option<u64>,
    /// Words occupied (all array elements).
    pub footprint: u64,
    /// Power-of-two alignment of `address`.
    pub alignment: u64,
}

impl RegisterEntry {
    pub fn items(&self) -> u64 {
        1u64 << self.log2_items
    }

    /// Words per array element.
    pub fn element_words(&self) -> u64 {
        self.footprint >> self.log2_items
    }
}

/// The compiled address map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterMap {
    pub data_width: u64,
    pub entries: Vec<RegisterEntry>,
    /// Words up to the end of the last register, alignment holes included.
    pub total_words: u64,
    /// Words left unused by alignment.
    pub padding_words: u64,
    /// `ceil(log2(total_words))`; 0 for zero or one word.
    pub min_address_width: u32,
}

impl RegisterMap {
    pub fn get(&self, name: &str) -> Option<&RegisterEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a RegisterEntry> + 'a {
        self.entries.iter().filter(move |e| e.group == group)
    }
}

/// Name of the macro that carries a peripheral's register address width.
pub fn address_width_macro(peripheral: &str) -> String {
    format!("{}_SWREG_ADDR_W", peripheral.to_uppercase())
}

/// Names referenced by register width expressions, in declaration order.
pub fn width_references(groups: &[RegisterGroup]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for group in groups {
        for reg in &group.registers {
            for name in reg.width.references() {
                if !out.contains(&name) {
                    out.push(name);
                }
            }
        }
    }
    out
}

/// `ceil(log2(words))`, with 0 and 1 both mapping to 0.
pub fn min_address_width(words: u64) -> u32 {
    if words <= 1 {
        0
    } else {
        u64::BITS - (words - 1).leading_zeros()
    }
}

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// Compile `groups` into an address map for a bus `data_width` bits wide.
///
/// `params` resolves width expressions; literal widths need no parameters.
pub fn compile(groups: &[RegisterGroup], data_width: u64, params: &ResolvedParameters) -> Result<RegisterMap> {
    if data_width == 0 {
        return Err(DescriptorError::InvalidExpression {
            context: "register map data width".to_string(),
            detail: "data width must be positive".to_string(),
        });
    }

    let mut entries = Vec::new();
    let mut cursor = 0u64;
    let mut padding = 0u64;

    for group in groups {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (position, reg) in group.registers.iter().enumerate() {
            if let Some(&first) = seen.get(reg.name.as_str()) {
                return Err(DescriptorError::DuplicateRegisterName {
                    group: group.name.clone(),
                    name: reg.name.clone(),
                    first,
                    second: position,
                });
            }
            seen.insert(&reg.name, position);

            let context = format!("width of register '{}.{}'", group.name, reg.name);
            let width = reg
                .width
                .eval(|name| params.get(name))
                .map_err(|e| eval_error(e, &context))?;
            if width <= 0 {
                return Err(DescriptorError::ZeroWidthRegister {
                    group: group.name.clone(),
                    name: reg.name.clone(),
                    position,
                });
            }
            let width = width as u64;

            let element_words = width.div_ceil(data_width);
            let footprint = element_words
                .checked_shl(reg.log2_items)
                .filter(|f| f >> reg.log2_items == element_words)
                .ok_or_else(|| DescriptorError::InvalidExpression {
                    context: format!("array size of register '{}.{}'", group.name, reg.name),
                    detail: format!("2^{} elements overflow the address space", reg.log2_items),
                })?;
            let alignment = footprint.next_power_of_two();
            let address = align_up(cursor, alignment);
            padding += address - cursor;
            cursor = address + footprint;

            entries.push(RegisterEntry {
                group: group.name.clone(),
                name: reg.name.clone(),
                access: reg.access,
                width,
                reset: reg.reset,
                log2_items: reg.log2_items,
                autoreg: reg.autoreg,
                description: reg.description.clone(),
                address,
                byte_address: (data_width % 8 == 0).then(|| address * (data_width / 8)),
                footprint,
                alignment,
            });
        }
    }

    let min_address_width = min_address_width(cursor);
    log::debug!(
        "register map: {} registers, {} words ({} padding), address width {}",
        entries.len(),
        cursor,
        padding,
        min_address_width
    );

    Ok(RegisterMap {
        data_width,
        entries,
        total_words: cursor,
        padding_words: padding,
        min_address_width,
    })
}
