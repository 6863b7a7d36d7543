//! Constants shared across the pipeline.
//!
//! The model geometry values must match the networks the weights were trained
//! with; changing them requires retrained weights.

/// Input width of the line segmentation network.
pub const LINE_MODEL_INPUT_WIDTH: u32 = 1024;

/// Input height of the line segmentation network.
pub const LINE_MODEL_INPUT_HEIGHT: u32 = 192;

/// Input tensor name of the line segmentation network.
pub const LINE_MODEL_INPUT_NAME: &str = "input_1";

/// Output tensor name of the line segmentation network.
pub const LINE_MODEL_OUTPUT_NAME: &str = "conv2d_22";

/// Probability above which a mask pixel is foreground.
pub const DEFAULT_LINE_THRESHOLD: f32 = 0.6;

/// Contours must have an area strictly greater than this to count as a line.
pub const DEFAULT_MIN_CONTOUR_AREA: f64 = 2000.0;

/// Side of the square structuring element used to grow each line mask.
pub const DEFAULT_DILATION_KERNEL: u32 = 8;

/// Number of dilation passes applied to each line mask.
pub const DEFAULT_DILATION_ITERATIONS: u32 = 6;

/// Clip limit of the local contrast enhancement.
pub const DEFAULT_CLAHE_CLIP_LIMIT: f32 = 0.8;

/// Tile grid (per axis) of the local contrast enhancement.
pub const DEFAULT_CLAHE_TILE_GRID: u32 = 24;

/// Input width (time axis) of the line recognizer.
pub const OCR_INPUT_WIDTH: u32 = 2000;

/// Input height of the line recognizer.
pub const OCR_INPUT_HEIGHT: u32 = 80;

/// Input tensor name of the line recognizer.
pub const OCR_INPUT_NAME: &str = "the_input";

/// Number of output timesteps of the recognizer; also the padded label length.
pub const MAX_LABEL_LENGTH: usize = 500;

/// Charset token at index 0, also used as the label pad token.
pub const UNKNOWN_TOKEN: &str = "[UNK]";

/// Charset token at the last index, the CTC blank.
pub const BLANK_TOKEN: &str = "[BLK]";

/// Placeholder standing for a word separator in transliterated labels.
pub const WORD_SEPARATOR: char = '§';

/// Weight of the mask when blending control images.
pub const CONTROL_OVERLAY_ALPHA: f32 = 0.6;

/// Default number of images fetched from a manifest.
pub const DEFAULT_FILE_LIMIT: i64 = 50;

/// Default train share of a dataset split.
pub const DEFAULT_SPLIT_RATIO: f64 = 0.8;

/// Default training batch size.
pub const DEFAULT_BATCH_SIZE: usize = 32;
