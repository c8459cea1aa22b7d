//! Contexts: reusable default options plus the invocation entry points.
//!
//! A [`Context`] owns a set of default [`Options`]. Every call through it
//! merges its per-call overrides onto those defaults. Derived contexts
//! snapshot the merged options at creation time.
//!
//! # Example
//!
//! ```no_run
//! use pshell::{Context, Options};
//!
//! # async fn demo() -> pshell::Result<()> {
//! let sh = Context::new().context(Options::new().with_echo_command(false).with_capture_output(true));
//! let outcome = sh.shell("node --version", Options::new()).await?.unwrap();
//! println!("node {}", outcome.stdout_text().unwrap_or_default().trim());
//! # Ok(())
//! # }
//! ```

use crate::config::Options;
use crate::shell::{invoke, shell_command, CommandLine, LiveInvocation, PendingOutcome};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

/// Live handle to a context's default options.
///
/// Changes made through this handle apply to every later call through the
/// owning context and its clones. Contexts derived earlier are unaffected.
#[derive(Debug, Clone)]
pub struct LiveOptions {
    inner: Arc<RwLock<Options>>,
}

impl LiveOptions {
    fn new(options: Options) -> Self {
        Self {
            inner: Arc::new(RwLock::new(options)),
        }
    }

    /// Copy of the current defaults.
    pub fn snapshot(&self) -> Options {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the defaults.
    pub fn set(&self, options: Options) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = options;
    }

    /// Modify the defaults in place.
    ///
    /// ```
    /// use pshell::Context;
    ///
    /// let ctx = Context::new();
    /// ctx.options().update(|o| o.ignore_error = Some(true));
    /// assert_eq!(ctx.options().snapshot().ignore_error, Some(true));
    /// ```
    pub fn update(&self, f: impl FnOnce(&mut Options)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard);
    }
}

/// Default options plus the `shell`/`spawn`/`exec`/`context` entry points.
///
/// Cloning a context yields another handle to the same live defaults.
#[derive(Debug, Clone)]
pub struct Context {
    options: LiveOptions,
}

impl Context {
    /// A root context seeded with [`Options::defaults`].
    pub fn new() -> Self {
        Self::with_options(Options::defaults())
    }

    /// A context with exactly these defaults.
    pub fn with_options(options: Options) -> Self {
        Self {
            options: LiveOptions::new(options),
        }
    }

    /// The live defaults of this context.
    pub fn options(&self) -> &LiveOptions {
        &self.options
    }

    /// Derive a context whose defaults are this context's merged with `overrides`.
    pub fn context(&self, overrides: Options) -> Context {
        Self::with_options(self.options.snapshot().merge(&overrides))
    }

    /// Run a command line through the platform shell and return its outcome.
    pub fn shell(&self, command: &str, overrides: Options) -> PendingOutcome {
        self.exec(command, overrides).outcome
    }

    /// Run a command line through the platform shell, keeping the process handle.
    pub fn exec(&self, command: &str, overrides: Options) -> LiveInvocation {
        let options = self.effective(&overrides);
        invoke(shell_command(command, &options), &options)
    }

    /// Run a program directly, without a shell.
    pub fn spawn<I, S>(&self, program: &str, args: I, overrides: Options) -> LiveInvocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = self.effective(&overrides);
        invoke(CommandLine::direct(program, args), &options)
    }

    fn effective(&self, overrides: &Options) -> Options {
        self.options.snapshot().merge(overrides)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: LazyLock<Context> = LazyLock::new(Context::new);

/// The process-wide root context used by the crate-level functions.
pub fn global() -> &'static Context {
    &GLOBAL
}

/// [`Context::shell`] on the [`global`] context.
pub fn shell(command: &str, overrides: Options) -> PendingOutcome {
    global().shell(command, overrides)
}

/// [`Context::exec`] on the [`global`] context.
pub fn exec(command: &str, overrides: Options) -> LiveInvocation {
    global().exec(command, overrides)
}

/// [`Context::spawn`] on the [`global`] context.
pub fn spawn<I, S>(program: &str, args: I, overrides: Options) -> LiveInvocation
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    global().spawn(program, args, overrides)
}

/// [`Context::context`] on the [`global`] context.
pub fn context(overrides: Options) -> Context {
    global().context(overrides)
}
