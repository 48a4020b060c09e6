pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[macro_export]
macro_rules! verify_config {
    ($name:expr, $expr:expr, $message:expr) => {{
        let result = $expr;
        $crate::result::verify_config(result, $name, $message)?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[inline]
pub fn verify_config(predicate: bool, name: &str, message: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_config(name, message)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cold]
pub fn invalid_config(name: &str, message: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidConfiguration {
        element: name.to_string(),
        message: message.to_string(),
    }
    .into())
}
