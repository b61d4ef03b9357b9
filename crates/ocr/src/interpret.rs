use std::collections::BTreeMap;

use docscan_core::{
    CodeInfo, ContentClass, DecodedCode, ExtractError, GenericCode, ProductCode, QrPayload,
    Symbology, WifiConfig, DECODE_ERROR_MARKER,
};

use crate::symbols::RawSymbol;

impl From<RawSymbol> for DecodedCode {
    /// Decode the payload as UTF-8 and interpret it by symbology. Invalid
    /// UTF-8 yields [`DECODE_ERROR_MARKER`] and [`CodeInfo::Undecodable`].
    fn from(symbol: RawSymbol) -> Self {
        let (text, info) = match std::str::from_utf8(&symbol.data) {
            Ok(text) => (text.to_string(), interpret(text, &symbol.symbology)),
            Err(_) => (DECODE_ERROR_MARKER.to_string(), CodeInfo::Undecodable),
        };
        DecodedCode {
            length: text.chars().count(),
            symbology: symbol.symbology,
            raw: symbol.data,
            text,
            rect: symbol.rect,
            polygon: symbol.polygon,
            detection_scale: None,
            info,
        }
    }
}

pub fn interpret(text: &str, symbology: &Symbology) -> CodeInfo {
    match symbology {
        Symbology::Qr => CodeInfo::Qr(qr_payload(text)),
        s if s.is_product() => CodeInfo::Product(product_code(text, s)),
        _ => CodeInfo::Generic(generic_code(text)),
    }
}

/// Classify a QR payload. Checks run in a fixed order; the first match wins.
pub fn qr_payload(data: &str) -> QrPayload {
    let lower = data.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        QrPayload::Url { url: data.to_string() }
    } else if let Some(rest) = data.strip_prefix("WIFI:") {
        QrPayload::Wifi(wifi_config(rest))
    } else if data.starts_with("BEGIN:VCARD") {
        QrPayload::Vcard { fields: vcard_fields(data) }
    } else if let Some(email) = data.strip_prefix("mailto:") {
        QrPayload::Email { email: email.to_string() }
    } else if let Some(phone) = data.strip_prefix("tel:") {
        QrPayload::Phone { phone: phone.to_string() }
    } else if let Some(phone) = data.strip_prefix("sms:") {
        QrPayload::Sms { phone: phone.to_string() }
    } else if let Some(coords) = data.strip_prefix("geo:") {
        let (latitude, longitude) = geo_coordinates(coords).ok().unzip();
        QrPayload::Location { latitude, longitude }
    } else {
        match serde_json::from_str(data) {
            Ok(json_data) => QrPayload::Json { json_data },
            Err(_) => QrPayload::Text,
        }
    }
}

fn wifi_config(body: &str) -> WifiConfig {
    let mut cfg = WifiConfig::default();
    for part in body.split(';') {
        let Some((key, value)) = part.split_once(':') else { continue };
        let value = value.to_string();
        match key {
            "T" => cfg.security = Some(value),
            "S" => cfg.ssid = Some(value),
            "P" => cfg.password = Some(value),
            "H" => cfg.hidden = Some(value),
            _ => {
                cfg.extra.insert(key.to_string(), value);
            }
        }
    }
    cfg
}

fn vcard_fields(data: &str) -> BTreeMap<String, String> {
    data.lines()
        .filter_map(|line| line.trim_end_matches('\r').split_once(':'))
        .map(|(k, v)| (k.to_lowercase(), v.to_string()))
        .collect()
}

fn geo_coordinates(coords: &str) -> Result<(f64, f64), ExtractError> {
    let malformed = || ExtractError::MalformedCodePayload(format!("geo:{coords}"));
    let mut parts = coords.split(',');
    let (Some(lat), Some(lon)) = (parts.next(), parts.next()) else {
        return Err(malformed());
    };
    // Trailing parameters after the longitude (`;u=35`) are not part of it.
    let lon = lon.split(';').next().unwrap_or(lon);
    let lat = lat.trim().parse::<f64>().map_err(|_| malformed())?;
    let lon = lon.trim().parse::<f64>().map_err(|_| malformed())?;
    Ok((lat, lon))
}

/// Split an all-digit EAN/UPC payload into its fixed-width fields.
pub fn product_code(data: &str, symbology: &Symbology) -> ProductCode {
    if data.is_empty() || !data.bytes().all(|b| b.is_ascii_digit()) {
        return ProductCode::default();
    }
    let field = |range: std::ops::Range<usize>| Some(data[range].to_string());
    let mut code = ProductCode { is_product_code: true, ..ProductCode::default() };
    match (symbology, data.len()) {
        (Symbology::Ean13, 13) => {
            code.country_code = field(0..3);
            code.manufacturer_code = field(3..8);
            code.product_code = field(8..12);
            code.check_digit = field(12..13);
        }
        (Symbology::UpcA, 12) => {
            code.manufacturer_code = field(0..6);
            code.product_code = field(6..11);
            code.check_digit = field(11..12);
        }
        _ => {}
    }
    code
}

pub fn generic_code(data: &str) -> GenericCode {
    let is_numeric = !data.is_empty() && data.chars().all(|c| c.is_ascii_digit());
    let is_alphanumeric = !data.is_empty() && data.chars().all(char::is_alphanumeric);
    let class = if is_numeric {
        ContentClass::Numeric
    } else if data.chars().any(char::is_alphabetic) {
        ContentClass::Alphanumeric
    } else {
        ContentClass::Unspecified
    };
    let lower = data.to_lowercase();
    GenericCode {
        class,
        is_numeric,
        is_alphanumeric,
        is_url: lower.starts_with("http://") || lower.starts_with("https://"),
        is_email: data.contains('@') && data.contains('.'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_core::CodeRect;

    fn raw(symbology: Symbology, data: &[u8]) -> RawSymbol {
        RawSymbol {
            symbology,
            data: data.to_vec(),
            rect: CodeRect { left: 1, top: 2, width: 3, height: 4 },
            polygon: vec![(1, 2), (4, 2), (4, 6), (1, 6)],
        }
    }

    #[test]
    fn wifi_payload() {
        let p = qr_payload("WIFI:T:WPA;S:MyNet;P:secret;H:false;");
        assert_eq!(
            p,
            QrPayload::Wifi(WifiConfig {
                security: Some("WPA".into()),
                ssid: Some("MyNet".into()),
                password: Some("secret".into()),
                hidden: Some("false".into()),
                extra: BTreeMap::new(),
            })
        );
    }

    #[test]
    fn wifi_unknown_keys_pass_through() {
        let QrPayload::Wifi(cfg) = qr_payload("WIFI:S:Cafe;X:1;;") else { panic!("not wifi") };
        assert_eq!(cfg.ssid.as_deref(), Some("Cafe"));
        assert_eq!(cfg.extra.get("X").map(String::as_str), Some("1"));
        assert!(cfg.password.is_none());
    }

    #[test]
    fn qr_prefix_classification() {
        assert_eq!(qr_payload("HTTPS://shop.example/r/1"), QrPayload::Url { url: "HTTPS://shop.example/r/1".into() });
        assert_eq!(qr_payload("mailto:a@b.co"), QrPayload::Email { email: "a@b.co".into() });
        assert_eq!(qr_payload("tel:+15551234"), QrPayload::Phone { phone: "+15551234".into() });
        assert_eq!(qr_payload("sms:5551234"), QrPayload::Sms { phone: "5551234".into() });
        assert_eq!(qr_payload("just words"), QrPayload::Text);
    }

    #[test]
    fn vcard_keys_lowercased() {
        let QrPayload::Vcard { fields } = qr_payload("BEGIN:VCARD\r\nFN:Ann Lee\r\nTEL:555\r\nEND:VCARD")
        else {
            panic!("not vcard")
        };
        assert_eq!(fields["fn"], "Ann Lee");
        assert_eq!(fields["tel"], "555");
        assert_eq!(fields["begin"], "VCARD");
    }

    #[test]
    fn geo_parses_or_omits() {
        assert_eq!(
            qr_payload("geo:40.7,-74.0"),
            QrPayload::Location { latitude: Some(40.7), longitude: Some(-74.0) }
        );
        assert_eq!(qr_payload("geo:north,west"), QrPayload::Location { latitude: None, longitude: None });
        assert_eq!(qr_payload("geo:12"), QrPayload::Location { latitude: None, longitude: None });
    }

    #[test]
    fn json_payload() {
        let QrPayload::Json { json_data } = qr_payload(r#"{"total": 12.5}"#) else { panic!("not json") };
        assert_eq!(json_data["total"], 12.5);
    }

    #[test]
    fn ean13_split() {
        let p = product_code("4006381333931", &Symbology::Ean13);
        assert!(p.is_product_code);
        assert_eq!(p.country_code.as_deref(), Some("400"));
        assert_eq!(p.manufacturer_code.as_deref(), Some("63813"));
        assert_eq!(p.product_code.as_deref(), Some("3393"));
        assert_eq!(p.check_digit.as_deref(), Some("1"));
    }

    #[test]
    fn upca_split_and_other_lengths() {
        let p = product_code("036000291452", &Symbology::UpcA);
        assert_eq!(p.manufacturer_code.as_deref(), Some("036000"));
        assert_eq!(p.product_code.as_deref(), Some("29145"));
        assert_eq!(p.check_digit.as_deref(), Some("2"));

        let p = product_code("96385074", &Symbology::Ean8);
        assert!(p.is_product_code);
        assert!(p.country_code.is_none() && p.check_digit.is_none());

        assert!(!product_code("12AB", &Symbology::Ean13).is_product_code);
    }

    #[test]
    fn generic_classes() {
        assert_eq!(generic_code("12345").class, ContentClass::Numeric);
        let g = generic_code("ABC-123");
        assert_eq!(g.class, ContentClass::Alphanumeric);
        assert!(!g.is_alphanumeric);
        assert_eq!(generic_code("--//").class, ContentClass::Unspecified);
        assert!(generic_code("user@example.com").is_email);
        assert!(generic_code("http://x.y").is_url);
    }

    #[test]
    fn decoded_code_from_symbol() {
        let code = DecodedCode::from(raw(Symbology::Code128, "PKG-77".as_bytes()));
        assert_eq!(code.text, "PKG-77");
        assert_eq!(code.length, 6);
        assert!(!code.is_error());
        assert!(matches!(code.info, CodeInfo::Generic(_)));
        assert!(code.detection_scale.is_none());
    }

    #[test]
    fn invalid_utf8_gets_error_marker() {
        let code = DecodedCode::from(raw(Symbology::Qr, &[0xff, 0xfe, 0x41]));
        assert_eq!(code.text, DECODE_ERROR_MARKER);
        assert!(code.is_error());
        assert_eq!(code.raw, vec![0xff, 0xfe, 0x41]);
    }
}
