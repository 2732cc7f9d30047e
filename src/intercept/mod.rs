pub mod interceptor;
pub mod types;

#[cfg(test)]
pub mod tests;

pub use interceptor::{Intercepted, Interceptor};
pub use types::*;

/// A [`SourceHint`](crate::analysis::SourceHint) pointing at the line where
/// the macro is expanded.
#[macro_export]
macro_rules! source_here {
    () => {
        $crate::analysis::SourceHint::Location($crate::analysis::SourceLocation::new(
            file!(),
            line!(),
        ))
    };
}
