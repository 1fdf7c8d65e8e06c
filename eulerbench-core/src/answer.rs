//! Answer Conversion
//!
//! Solution methods may return any integer type, an `Option` of one (no value),
//! a `Result` (failure), or `()`. `IntoAnswer` normalizes all of them into a
//! [`MethodResult`].

use std::fmt::Display;

/// Integer answer produced by a solution method
pub type Answer = i64;

/// Normalized method result: `Err` is a failure, `Ok(None)` a run without a value
pub type MethodResult = Result<Option<Answer>, String>;

/// Conversion from a method's return value into a [`MethodResult`]
pub trait IntoAnswer {
    /// Normalize this value
    fn into_answer(self) -> MethodResult;
}

macro_rules! impl_into_answer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoAnswer for $ty {
                #[allow(clippy::useless_conversion)]
                fn into_answer(self) -> MethodResult {
                    Answer::try_from(self)
                        .map(Some)
                        .map_err(|_| format!("answer {} does not fit in a 64-bit signed integer", self))
                }
            }
        )*
    };
}

impl_into_answer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl IntoAnswer for () {
    fn into_answer(self) -> MethodResult {
        Ok(None)
    }
}

impl<T: IntoAnswer> IntoAnswer for Option<T> {
    fn into_answer(self) -> MethodResult {
        match self {
            Some(value) => value.into_answer(),
            None => Ok(None),
        }
    }
}

impl<T: IntoAnswer, E: Display> IntoAnswer for Result<T, E> {
    fn into_answer(self) -> MethodResult {
        match self {
            Ok(value) => value.into_answer(),
            Err(e) => Err(e.to_string()),
        }
    }
}
