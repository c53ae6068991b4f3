// Canvas:
pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 500;
pub const JPEG_QUALITY: u8 = 92;

// Upload:
pub const DEFAULT_UPLOAD_URL: &str = "http://localhost:3000/upload";
pub const UPLOAD_IMAGE_FILENAME: &str = "drawing.jpg";
pub const UPLOAD_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

// Identity:
pub const TOKEN_KEY: &str = "authToken";
pub const APP_DIR_NAME: &str = "doodle-duel";

// Avatars a client picks from when the player hasn't chosen one.
pub const DEFAULT_AVATARS: [&str; 6] = [
    "avatars/cat.png",
    "avatars/dog.png",
    "avatars/fox.png",
    "avatars/owl.png",
    "avatars/frog.png",
    "avatars/bear.png",
];
