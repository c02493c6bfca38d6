macro_rules! corrupt {
    ($($args:tt)+) => {
        return Err($crate::error::Error::Corrupt(format!($($args)+)))
    };
}

macro_rules! internal {
    ($($args:tt)+) => {
        return Err($crate::error::Error::Internal(format!($($args)+)))
    };
}
