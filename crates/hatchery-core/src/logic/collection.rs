use super::{Context, Logic, LogicError};
use crate::model::BlueprintCode;
use candid::{CandidType, decode_args, decode_one, encode_one};

const ENTRY_PREFIX: &str = "entry:";

///
/// CollectionLogic
///
/// Reference blueprint: an owner-writable keyed collection. Arguments and
/// results are Candid-encoded.
///
/// | method    | args              | result            | since |
/// |-----------|-------------------|-------------------|-------|
/// | `version` | `()`              | `nat32`           | v1    |
/// | `get`     | `text`            | `opt blob`        | v1    |
/// | `set`     | `(text, blob)`    | `()` (owner only) | v1    |
/// | `count`   | `()`              | `nat64`           | v2    |
///

#[derive(Clone, Copy, Debug)]
pub struct CollectionLogic {
    version: u32,
}

impl CollectionLogic {
    pub const NAME: &'static str = "collection";

    #[must_use]
    pub const fn new(version: u32) -> Self {
        Self { version }
    }
}

impl Logic for CollectionLogic {
    fn code(&self) -> BlueprintCode {
        BlueprintCode::new(Self::NAME, self.version)
    }

    fn execute(
        &self,
        ctx: &mut Context<'_>,
        method: &str,
        args: &[u8],
    ) -> Result<Vec<u8>, LogicError> {
        match method {
            "version" => encode(method, self.version),
            "get" => {
                let key: String = decode(method, decode_one(args))?;
                let value = ctx
                    .storage()
                    .get(&format!("{ENTRY_PREFIX}{key}"))
                    .map(<[u8]>::to_vec);

                encode(method, value)
            }
            "set" => {
                if ctx.caller != ctx.owner {
                    return Err(LogicError::Denied {
                        method: method.to_string(),
                        caller: ctx.caller,
                    });
                }

                let (key, value): (String, Vec<u8>) = decode(method, decode_args(args))?;
                ctx.storage_mut().set(format!("{ENTRY_PREFIX}{key}"), value);

                encode(method, ())
            }
            "count" if self.version >= 2 => {
                let count = ctx.storage().len() as u64;

                encode(method, count)
            }
            _ => Err(LogicError::UnknownMethod {
                method: method.to_string(),
                code: self.code(),
            }),
        }
    }
}

// -------------------------------------------------------------------------
// Helpers
// -------------------------------------------------------------------------

fn decode<T>(method: &str, res: Result<T, candid::Error>) -> Result<T, LogicError> {
    res.map_err(|err| LogicError::InvalidArgs {
        method: method.to_string(),
        reason: err.to_string(),
    })
}

fn encode<T: CandidType>(method: &str, value: T) -> Result<Vec<u8>, LogicError> {
    encode_one(value).map_err(|err| LogicError::Encode(format!("{method}: {err}")))
}

///
/// TESTS
///
