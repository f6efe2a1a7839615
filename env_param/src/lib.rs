//! Global parameters initialized from environment variables.
//!
//! An [`EnvParam`] associates an environment variable name with a default
//! value given as a string. The parameter is resolved once, on first access:
//! if the variable is set and parses to the target type its value is used,
//! otherwise the default applies.
//!
//! ```
//! use env_param::EnvParam;
//! static TABLE_SIZE: EnvParam<usize> = EnvParam::new("TABLE_SIZE", "4096");
//!
//! assert_eq!(TABLE_SIZE.get(), 4096); // variable unset, default applies
//! ```
//!
//! The intended use is for internal tunables that do not warrant a command
//! line flag. Changes to the environment after the first access are ignored;
//! [`EnvParam::set`] forces a value programmatically and panics if the
//! parameter was already resolved.

use std::str::FromStr;

pub struct EnvParam<T> {
    value: once_cell::sync::OnceCell<T>,
    env: &'static str,
    default: &'static str,
}

impl<T> EnvParam<T> {
    /// Declares a parameter tied to the environment variable `env`, falling
    /// back to `default` when the variable is absent or malformed.
    pub const fn new(env: &'static str, default: &'static str) -> EnvParam<T> {
        EnvParam {
            value: once_cell::sync::OnceCell::new(),
            env,
            default,
        }
    }
}

impl<T: FromStr> EnvParam<T> {
    /// Resolves and returns the parameter value by copy.
    ///
    /// # Panic
    /// Panics if the declared default value does not parse to `T`.
    pub fn get(&self) -> T
    where
        T: Copy,
    {
        *self.get_ref()
    }

    /// Resolves the parameter on first call and returns a reference to it.
    ///
    /// A malformed environment value is reported on stderr and ignored in
    /// favor of the default.
    ///
    /// # Panic
    /// Panics if the declared default value does not parse to `T`.
    pub fn get_ref(&self) -> &T {
        self.value.get_or_init(|| match std::env::var(self.env) {
            Ok(s) => T::from_str(&s).unwrap_or_else(|_| {
                eprintln!(
                    "[env_param] WARNING {}: unreadable value \"{}\", falling back to \"{}\".",
                    self.env, s, self.default
                );
                self.parsed_default()
            }),
            Err(_) => self.parsed_default(),
        })
    }

    /// Forces the parameter to `value`.
    ///
    /// # Panic
    /// Panics if the parameter is already resolved, which typically means it
    /// was read before.
    pub fn set(&self, value: T) {
        if self.value.set(value).is_err() {
            panic!("Parameter {} is already initialized (i.e. was previously accessed).", self.env);
        }
    }

    fn parsed_default(&self) -> T {
        match T::from_str(self.default) {
            Ok(v) => v,
            Err(_) => panic!("[env_param] {}: invalid default value \"{}\".", self.env, self.default),
        }
    }
}
