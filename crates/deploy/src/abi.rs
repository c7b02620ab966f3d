//! ABI encoding of constructor and function arguments.
//!
//! Plan arguments are loosely typed (an address, an unsigned integer, a list...).
//! They are coerced to the exact Solidity types declared by the artifact ABI or by
//! a function signature before encoding.

use alloy_core::{
    dyn_abi::{DynSolType, DynSolValue, Specifier},
    json_abi::{Function, JsonAbi, Param},
    primitives::{Address, B256, Bytes, U256},
};

/// A resolved argument value, ready to be coerced to an ABI type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Address(Address),
    Uint(U256),
    Bytes32(B256),
    String(String),
    Bool(bool),
    List(Vec<ArgValue>),
}

impl ArgValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Address(_) => "address",
            Self::Uint(_) => "uint",
            Self::Bytes32(_) => "bytes32",
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::List(_) => "list",
        }
    }
}

impl From<Address> for ArgValue {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<u64> for ArgValue {
    fn from(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }
}

/// Coerce a value to the given Solidity type.
pub fn coerce(value: &ArgValue, ty: &DynSolType) -> Result<DynSolValue, String> {
    match (value, ty) {
        (ArgValue::Address(address), DynSolType::Address) => Ok(DynSolValue::Address(*address)),
        (ArgValue::Uint(v), DynSolType::Uint(bits)) => {
            if v.bit_len() > *bits {
                return Err(format!("value {v} does not fit in uint{bits}"));
            }
            Ok(DynSolValue::Uint(*v, *bits))
        }
        (ArgValue::Bytes32(word), DynSolType::FixedBytes(32)) => {
            Ok(DynSolValue::FixedBytes(*word, 32))
        }
        (ArgValue::String(s), DynSolType::String) => Ok(DynSolValue::String(s.clone())),
        (ArgValue::Bool(b), DynSolType::Bool) => Ok(DynSolValue::Bool(*b)),
        (ArgValue::List(items), DynSolType::Array(inner)) => items
            .iter()
            .map(|item| coerce(item, inner))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Array),
        (ArgValue::List(items), DynSolType::FixedArray(inner, len)) => {
            if items.len() != *len {
                return Err(format!("expected {len} elements, got {}", items.len()));
            }
            items
                .iter()
                .map(|item| coerce(item, inner))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::FixedArray)
        }
        (value, ty) => Err(format!("expected {}, got {}", ty.sol_type_name(), value.kind())),
    }
}

/// Coerce and ABI-encode a full parameter list (no selector).
fn encode_params(params: &[Param], args: &[ArgValue]) -> Result<Vec<u8>, String> {
    if params.len() != args.len() {
        return Err(format!(
            "expected {} arguments, got {}",
            params.len(),
            args.len()
        ));
    }

    let values = params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty = param
                .resolve()
                .map_err(|e| format!("unsupported parameter type {}: {e}", param.ty))?;
            coerce(arg, &ty).map_err(|e| match param.name.as_str() {
                "" => e,
                name => format!("{name}: {e}"),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DynSolValue::Tuple(values).abi_encode_params())
}

/// Encode constructor arguments against an artifact ABI.
///
/// Contracts without an explicit constructor accept no arguments.
pub fn encode_constructor(abi: &JsonAbi, args: &[ArgValue]) -> Result<Vec<u8>, String> {
    match &abi.constructor {
        Some(constructor) => encode_params(&constructor.inputs, args),
        None if args.is_empty() => Ok(Vec::new()),
        None => Err(format!(
            "contract has no constructor but {} arguments were given",
            args.len()
        )),
    }
}

/// Parse a function signature such as `addMinter(address)`.
pub fn parse_function(signature: &str) -> Result<Function, String> {
    Function::parse(signature).map_err(|e| format!("invalid function signature {signature:?}: {e}"))
}

/// Build calldata (selector + encoded arguments) for a function signature.
pub fn encode_call(signature: &str, args: &[ArgValue]) -> Result<Bytes, String> {
    let function = parse_function(signature)?;
    let mut calldata = function.selector().to_vec();
    calldata.extend(encode_params(&function.inputs, args)?);
    Ok(calldata.into())
}

#[cfg(test)]
mod tests {
    use alloy_core::primitives::{address, b256};

    use super::*;

    fn constructor_abi(inputs: serde_json::Value) -> JsonAbi {
        serde_json::from_value(serde_json::json!([{
            "type": "constructor",
            "inputs": inputs,
            "stateMutability": "nonpayable"
        }]))
        .unwrap()
    }

    #[test]
    fn test_encode_call_selector() {
        let calldata = encode_call(
            "transfer(address,uint256)",
            &[
                address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").into(),
                ArgValue::from(1u64),
            ],
        )
        .unwrap();

        assert_eq!(&calldata[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(calldata.len(), 4 + 64);
    }

    #[test]
    fn test_uint_overflow_is_rejected() {
        let err = coerce(&ArgValue::from(70_000u64), &DynSolType::Uint(16)).unwrap_err();
        assert!(err.contains("uint16"), "{err}");

        assert!(coerce(&ArgValue::from(65_535u64), &DynSolType::Uint(16)).is_ok());
    }

    #[test]
    fn test_constructor_argument_count() {
        let abi = constructor_abi(serde_json::json!([
            {"name": "_factory", "type": "address", "internalType": "address"},
            {"name": "_WETH", "type": "address", "internalType": "address"}
        ]));

        let err = encode_constructor(&abi, &[Address::ZERO.into()]).unwrap_err();
        assert!(err.contains("expected 2 arguments"), "{err}");

        let encoded = encode_constructor(&abi, &[Address::ZERO.into(), Address::ZERO.into()])
            .unwrap();
        assert_eq!(encoded.len(), 64);
    }

    #[test]
    fn test_constructor_type_mismatch_names_parameter() {
        let abi = constructor_abi(serde_json::json!([
            {"name": "_keyHash", "type": "bytes32", "internalType": "bytes32"}
        ]));

        let err = encode_constructor(&abi, &[ArgValue::from(1u64)]).unwrap_err();
        assert!(err.starts_with("_keyHash"), "{err}");
        assert!(err.contains("bytes32"), "{err}");
    }

    #[test]
    fn test_lists_and_strings() {
        let abi = constructor_abi(serde_json::json!([
            {"name": "_name", "type": "string", "internalType": "string"},
            {"name": "_payees", "type": "address[]", "internalType": "address[]"},
            {"name": "_shares", "type": "uint16[]", "internalType": "uint16[]"},
            {"name": "_keyHash", "type": "bytes32", "internalType": "bytes32"}
        ]));

        let args = vec![
            ArgValue::String("Minter 3".to_string()),
            ArgValue::List(vec![Address::repeat_byte(1).into(), Address::repeat_byte(2).into()]),
            ArgValue::List(vec![ArgValue::from(60u64), ArgValue::from(40u64)]),
            ArgValue::Bytes32(b256!(
                "0x79d3d8832d904592c0bf9818b621522c988bb8b0c05cdc3b15aea1b6e8db0c15"
            )),
        ];

        assert!(encode_constructor(&abi, &args).is_ok());
    }

    #[test]
    fn test_missing_constructor() {
        let abi = JsonAbi::default();
        assert_eq!(encode_constructor(&abi, &[]).unwrap(), Vec::<u8>::new());
        assert!(encode_constructor(&abi, &[ArgValue::from(1u64)]).is_err());
    }
}
