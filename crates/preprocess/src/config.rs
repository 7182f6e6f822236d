/// Model input resolution as `(width, height)`.
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (640, 640);

/// Divisor narrowing a 16-bit channel to 8 bits (65535 / 255).
pub const U16_TO_U8_DIVISOR: u16 = 257;
