use std::{path::Path, sync::Arc};

/// Cheaply cloneable immutable string shared between actors.
pub type ArcStr = Arc<str>;

/// Cheaply cloneable immutable path shared between actors.
pub type ArcPath = Arc<Path>;

/// Installs a panic hook that flushes stdout before delegating to the default
/// hook, so partially printed CLI output is not interleaved with the panic.
pub fn install_panic_hook() -> anyhow::Result<()> {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        use std::io::Write;
        let _ = std::io::stdout().flush();
        default_hook(info);
    }));
    Ok(())
}
