//! Custom attribute value decoding (ECMA-335 II.23.3).
//!
//! The value blob of a custom attribute has no self-describing types for its fixed
//! arguments; their types come from the constructor's method signature. Both are walked in
//! lockstep here.

use crate::{file::parser::Parser, metadata::reader::AttributeValue, Result};

const ELEMENT_TYPE_VOID: u8 = 0x01;
const ELEMENT_TYPE_BOOLEAN: u8 = 0x02;
const ELEMENT_TYPE_CHAR: u8 = 0x03;
const ELEMENT_TYPE_I1: u8 = 0x04;
const ELEMENT_TYPE_U1: u8 = 0x05;
const ELEMENT_TYPE_I2: u8 = 0x06;
const ELEMENT_TYPE_U2: u8 = 0x07;
const ELEMENT_TYPE_I4: u8 = 0x08;
const ELEMENT_TYPE_U4: u8 = 0x09;
const ELEMENT_TYPE_I8: u8 = 0x0A;
const ELEMENT_TYPE_U8: u8 = 0x0B;
const ELEMENT_TYPE_R4: u8 = 0x0C;
const ELEMENT_TYPE_R8: u8 = 0x0D;
const ELEMENT_TYPE_STRING: u8 = 0x0E;
const ELEMENT_TYPE_CLASS: u8 = 0x12;

const CALLING_CONVENTION_GENERIC: u8 = 0x10;

/// Decode the fixed arguments of a custom attribute.
///
/// `ctor_signature` is the constructor's MethodDefSig/MemberRefSig blob and `value` the
/// attribute's value blob. `is_system_type` receives the TypeDefOrRefOrSpec-encoded token of a
/// `CLASS` parameter and says whether it names `System.Type`, the only class whose argument
/// encoding is known without loading another assembly.
///
/// Decoding stops at the first argument it cannot size, which is then reported as
/// [`AttributeValue::Unsupported`].
///
/// # Errors
/// Returns an error if either blob is truncated or the value blob lacks the `0x0001` prolog.
pub fn decode_fixed_args(
    ctor_signature: &[u8],
    value: &[u8],
    is_system_type: impl Fn(u32) -> bool,
) -> Result<Vec<AttributeValue>> {
    let mut signature = Parser::new(ctor_signature);
    let calling_convention = signature.read_le::<u8>()?;
    if calling_convention & CALLING_CONVENTION_GENERIC != 0 {
        let _generic_params = signature.read_compressed_uint()?;
    }

    let param_count = signature.read_compressed_uint()?;
    if signature.read_le::<u8>()? != ELEMENT_TYPE_VOID {
        return Err(malformed_error!("Attribute constructor does not return void"));
    }

    let mut args = Parser::new(value);
    let prolog = args.read_le::<u16>()?;
    if prolog != 0x0001 {
        return Err(malformed_error!("Invalid custom attribute prolog - {}", prolog));
    }

    let mut fixed_args = Vec::with_capacity(param_count as usize);
    for _ in 0..param_count {
        let element_type = signature.read_le::<u8>()?;
        let value = match element_type {
            ELEMENT_TYPE_BOOLEAN => AttributeValue::Boolean(args.read_le::<u8>()? != 0),
            ELEMENT_TYPE_CHAR => AttributeValue::Char(args.read_le::<u16>()?),
            ELEMENT_TYPE_I1 => AttributeValue::Integer(args.read_le::<i8>()?.into()),
            ELEMENT_TYPE_U1 => AttributeValue::Integer(args.read_le::<u8>()?.into()),
            ELEMENT_TYPE_I2 => AttributeValue::Integer(args.read_le::<i16>()?.into()),
            ELEMENT_TYPE_U2 => AttributeValue::Integer(args.read_le::<u16>()?.into()),
            ELEMENT_TYPE_I4 => AttributeValue::Integer(args.read_le::<i32>()?.into()),
            ELEMENT_TYPE_U4 => AttributeValue::Integer(args.read_le::<u32>()?.into()),
            ELEMENT_TYPE_I8 => AttributeValue::Integer(args.read_le::<i64>()?.into()),
            ELEMENT_TYPE_U8 => AttributeValue::Integer(args.read_le::<u64>()?.into()),
            ELEMENT_TYPE_R4 => AttributeValue::Float(args.read_le::<f32>()?.into()),
            ELEMENT_TYPE_R8 => AttributeValue::Float(args.read_le::<f64>()?),
            ELEMENT_TYPE_STRING => AttributeValue::String(args.read_ser_string()?),
            ELEMENT_TYPE_CLASS => {
                let token = signature.read_compressed_uint()?;
                if !is_system_type(token) {
                    fixed_args.push(AttributeValue::Unsupported);
                    break;
                }
                AttributeValue::Type(args.read_ser_string()?)
            }
            _ => {
                fixed_args.push(AttributeValue::Unsupported);
                break;
            }
        };

        fixed_args.push(value);
    }

    Ok(fixed_args)
}
