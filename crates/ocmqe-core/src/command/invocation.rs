//! External command descriptions

use std::fmt;

use camino::Utf8PathBuf;

const MASK: &str = "***";

#[derive(Clone, PartialEq, Eq)]
struct Arg {
    value: String,
    /// Printed instead of `value` in logs; `None` for plain arguments
    display: Option<String>,
}

impl Arg {
    fn plain(value: String) -> Self {
        Self {
            value,
            display: None,
        }
    }

    fn masked(value: String, display: String) -> Self {
        Self {
            value,
            display: Some(display),
        }
    }

    fn shown(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.value)
    }
}

/// A program with its arguments and environment
///
/// Secret values (tokens, passwords) are added with the `secret_*` methods;
/// they are passed to the process unchanged but masked whenever the
/// invocation is displayed.
///
/// # Example
///
/// ```rust
/// use ocmqe_core::Invocation;
///
/// let inv = Invocation::new("ocm")
///     .assign("--v", "0")
///     .args(["create", "idp"])
///     .option("-c", "2ans0g24pc4l4f08fcu6tdusf883avvu")
///     .secret_option("--password", "hunter2");
///
/// assert_eq!(
///     inv.to_string(),
///     "ocm --v=0 create idp -c 2ans0g24pc4l4f08fcu6tdusf883avvu --password ***"
/// );
/// assert_eq!(inv.arguments().last().map(String::as_str), Some("hunter2"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<Arg>,
    envs: Vec<(String, String)>,
    current_dir: Option<Utf8PathBuf>,
}

impl Invocation {
    /// Start an invocation of `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(Arg::plain(arg.into()));
        self
    }

    /// Append several arguments
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args
            .extend(args.into_iter().map(|a| Arg::plain(a.into())));
        self
    }

    /// Append `name value` as two arguments
    pub fn option(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arg(name).arg(value)
    }

    /// Append `name=value` as one argument
    pub fn assign(self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.arg(format!("{}={}", name.as_ref(), value.as_ref()))
    }

    /// Append `name value` with the value masked in logs
    pub fn secret_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push(Arg::plain(name.into()));
        self.args.push(Arg::masked(value.into(), MASK.to_string()));
        self
    }

    /// Append `name=value` with the value masked in logs
    pub fn secret_assign(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        self.args.push(Arg::masked(
            format!("{}={}", name, value.as_ref()),
            format!("{}={}", name, MASK),
        ));
        self
    }

    /// Set an environment variable for the process
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Run the process in `dir`
    pub fn current_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Program name or path
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Actual argument values, secrets included
    pub fn arguments(&self) -> Vec<String> {
        self.args.iter().map(|a| a.value.clone()).collect()
    }

    /// Environment overrides
    pub fn envs(&self) -> &[(String, String)] {
        &self.envs
    }

    /// Working directory override
    pub fn working_dir(&self) -> Option<&Utf8PathBuf> {
        self.current_dir.as_ref()
    }

    /// Check whether a plain argument equals `value`
    pub fn has_arg(&self, value: &str) -> bool {
        self.args
            .iter()
            .any(|a| a.display.is_none() && a.value == value)
    }
}

fn quote(arg: &str) -> String {
    if !arg.is_empty()
        && !arg
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '"')
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg.shown()))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.shown(), f)
    }
}

/// Masks secrets like `Display`; only environment variable names are shown
impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env_names: Vec<_> = self.envs.iter().map(|(k, _)| k).collect();
        f.debug_struct("Invocation")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("envs", &env_names)
            .field("current_dir", &self.current_dir)
            .finish()
    }
}
