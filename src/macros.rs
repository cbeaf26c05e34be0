/// Helper macro to get real values out of Value while retaining
/// proper errors in methods.
/// Takes 4 args: method name, argument name, the expected type and the actual value
macro_rules! try_get_value {
    ($method_name:expr, $arg_name:expr, $ty:ty, $val:expr) => {{
        match ::serde_json::value::from_value::<$ty>($val.clone()) {
            Ok(s) => s,
            Err(_) => {
                return Err($crate::errors::Error::msg(format!(
                    "Method `{}` received an incorrect type for arg `{}`: got `{}` but expected {}",
                    $method_name,
                    $arg_name,
                    $val,
                    stringify!($ty)
                )));
            }
        }
    }};
}
