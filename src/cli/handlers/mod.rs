pub mod caps;
pub mod decode;
pub mod encode;
