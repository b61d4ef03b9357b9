use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Text placed in `DecodedCode::text` when the payload bytes are not valid UTF-8.
pub const DECODE_ERROR_MARKER: &str = "Error decoding";

/// Encoding scheme of a scannable code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Symbology {
    Qr,
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Code128,
    Other(String),
}

impl Symbology {
    /// Retail product symbologies whose numeric payload has a fixed field layout.
    pub fn is_product(&self) -> bool {
        matches!(self, Symbology::Ean13 | Symbology::Ean8 | Symbology::UpcA | Symbology::UpcE)
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbology::Qr => write!(f, "QRCODE"),
            Symbology::Ean13 => write!(f, "EAN13"),
            Symbology::Ean8 => write!(f, "EAN8"),
            Symbology::UpcA => write!(f, "UPCA"),
            Symbology::UpcE => write!(f, "UPCE"),
            Symbology::Code128 => write!(f, "CODE128"),
            Symbology::Other(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Symbology {
    fn from(s: &str) -> Self {
        match s.to_ascii_uppercase().replace(['_', '-'], "").as_str() {
            "QR" | "QRCODE" => Symbology::Qr,
            "EAN13" => Symbology::Ean13,
            "EAN8" => Symbology::Ean8,
            "UPCA" => Symbology::UpcA,
            "UPCE" => Symbology::UpcE,
            "CODE128" => Symbology::Code128,
            _ => Symbology::Other(s.to_string()),
        }
    }
}

impl From<String> for Symbology {
    fn from(s: String) -> Self {
        Symbology::from(s.as_str())
    }
}

impl From<Symbology> for String {
    fn from(s: Symbology) -> Self {
        s.to_string()
    }
}

/// Axis-aligned bounding rectangle in image pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl CodeRect {
    /// Smallest rectangle enclosing every vertex; zero-sized for an empty polygon.
    pub fn bounding(polygon: &[(i32, i32)]) -> Self {
        let Some(&(x0, y0)) = polygon.first() else {
            return Self::default();
        };
        let (min_x, min_y, max_x, max_y) = polygon.iter().fold(
            (x0, y0, x0, y0),
            |(mnx, mny, mxx, mxy), &(x, y)| (mnx.min(x), mny.min(y), mxx.max(x), mxy.max(y)),
        );
        Self { left: min_x, top: min_y, width: max_x - min_x, height: max_y - min_y }
    }

    /// Map a rectangle found on an image resized by `scale` back to source coordinates.
    /// Each component is divided by `scale` and truncated toward zero.
    pub fn unscale(self, scale: f32) -> Self {
        Self {
            left: unscale_coord(self.left, scale),
            top: unscale_coord(self.top, scale),
            width: unscale_coord(self.width, scale),
            height: unscale_coord(self.height, scale),
        }
    }
}

pub fn unscale_coord(v: i32, scale: f32) -> i32 {
    (v as f64 / scale as f64) as i32
}

/// Parsed WiFi network configuration (`WIFI:T:<sec>;S:<ssid>;P:<pass>;H:<hidden>;`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WifiConfig {
    pub security: Option<String>,
    pub ssid: Option<String>,
    pub password: Option<String>,
    pub hidden: Option<String>,
    /// Keys other than T/S/P/H, stored verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// Interpretation of a QR payload, chosen by prefix and shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QrPayload {
    Url { url: String },
    Wifi(WifiConfig),
    Vcard { fields: BTreeMap<String, String> },
    Email { email: String },
    Phone { phone: String },
    Sms { phone: String },
    Location {
        #[serde(skip_serializing_if = "Option::is_none")]
        latitude: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        longitude: Option<f64>,
    },
    Json { json_data: serde_json::Value },
    Text,
}

/// Field layout of an EAN/UPC payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCode {
    pub is_product_code: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_digit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentClass {
    Numeric,
    Alphanumeric,
    Unspecified,
}

/// Classification used for CODE128 and any symbology without a dedicated parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericCode {
    pub class: ContentClass,
    pub is_numeric: bool,
    pub is_alphanumeric: bool,
    pub is_url: bool,
    pub is_email: bool,
}

/// Structured interpretation of a decoded payload, dispatched by symbology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodeInfo {
    Qr(QrPayload),
    Product(ProductCode),
    Generic(GenericCode),
    /// The payload could not be decoded as text.
    Undecodable,
}

/// A single QR code or barcode found in an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedCode {
    pub symbology: Symbology,
    #[serde(serialize_with = "raw_as_hex", deserialize_with = "raw_from_hex")]
    pub raw: Vec<u8>,
    /// UTF-8 payload, or [`DECODE_ERROR_MARKER`].
    pub text: String,
    /// Payload length in characters.
    pub length: usize,
    pub rect: CodeRect,
    pub polygon: Vec<(i32, i32)>,
    /// Resize factor the code was found at (multi-scale detection only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_scale: Option<f32>,
    pub info: CodeInfo,
}

impl DecodedCode {
    pub fn is_error(&self) -> bool {
        matches!(self.info, CodeInfo::Undecodable)
    }

    /// Return this code with geometry mapped back from an image resized by `scale`.
    pub fn unscaled(mut self, scale: f32) -> Self {
        if scale != 1.0 {
            self.rect = self.rect.unscale(scale);
            self.polygon = self
                .polygon
                .iter()
                .map(|&(x, y)| (unscale_coord(x, scale), unscale_coord(y, scale)))
                .collect();
        }
        self.detection_scale = Some(scale);
        self
    }
}

/// Lowercase hex encoding (two chars per byte).
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

fn raw_as_hex<S: Serializer>(raw: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&to_hex(raw))
}

fn raw_from_hex<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(d)?;
    from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid hex: '{s}'")))
}
