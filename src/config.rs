use std::env;
use std::str::FromStr;

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Returns the parsed value of the named environment variable, or `default`
/// if it is not set. Panics if the variable is set but cannot be parsed.
pub fn get_optional<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("could not parse {} environment variable", name)),
        Err(_) => default,
    }
}
