mod health_check;
mod preflight;
mod signup;
pub use health_check::*;
pub use preflight::*;
pub use signup::*;

/// Write `e` followed by every error in its `source` chain, one per line. Used
/// for the `Debug` impls of route errors, which is what ends up in the logs.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }
    Ok(())
}
