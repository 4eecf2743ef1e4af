//! The form part store.

use crate::body::RequestBody;
use crate::boundary;
use crate::codec::{self, DecodeLimits};
use crate::error::{DecodingError, EncodingError};
use crate::params::SearchParams;
use crate::part::BodyPart;
use crate::APPLICATION_JSON;
use bytes::Bytes;
use serde::Serialize;
use std::sync::OnceLock;

/// An ordered collection of form parts plus the boundary used to encode them.
///
/// The boundary is generated on first use by [`FormData::encode`],
/// [`FormData::content_type`] or [`FormData::boundary`] and never changes
/// afterwards, so all three always agree.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    boundary: OnceLock<String>,
    parts: Vec<BodyPart>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty form with a fixed boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Result<Self, EncodingError> {
        let boundary = boundary.into();
        if boundary::validate(&boundary).is_err() {
            return Err(EncodingError::InvalidBoundary(boundary));
        }
        Ok(Self {
            boundary: OnceLock::from(boundary),
            parts: Vec::new(),
        })
    }

    /// Appends a text field.
    pub fn append_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value: String = value.into();
        self.parts
            .push(BodyPart::new(name, None, None, value.into_bytes()));
    }

    /// Appends a file field with its filename and content type.
    pub fn append_binary(
        &mut self,
        name: impl Into<String>,
        data: impl Into<Bytes>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) {
        self.parts.push(BodyPart::new(
            name,
            Some(filename.into()),
            Some(content_type.into()),
            data,
        ));
    }

    /// Appends a URL-encoded parameter set as its query string.
    pub fn append_params(&mut self, name: impl Into<String>, params: &SearchParams) {
        self.parts.push(BodyPart::new(
            name,
            None,
            None,
            params.to_query_string().into_bytes(),
        ));
    }

    /// Appends a value serialized as JSON.
    pub fn append_json<T: Serialize + ?Sized>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<(), EncodingError> {
        let data = serde_json::to_vec(value)?;
        self.parts.push(BodyPart::new(
            name,
            None,
            Some(APPLICATION_JSON.to_string()),
            data,
        ));
        Ok(())
    }

    /// Appends a value that encodes its own body and declares its content type.
    pub fn append_body<B: RequestBody + ?Sized>(
        &mut self,
        name: impl Into<String>,
        body: &B,
    ) -> Result<(), EncodingError> {
        let data = body.encode_body()?;
        self.parts.push(BodyPart::new(
            name,
            None,
            Some(body.content_type().into_owned()),
            data,
        ));
        Ok(())
    }

    /// Appends a prebuilt part.
    pub fn append_part(&mut self, part: BodyPart) {
        self.parts.push(part);
    }

    /// Returns the boundary, generating it on first call.
    pub fn boundary(&self) -> &str {
        self.boundary.get_or_init(boundary::generate)
    }

    /// Returns the `Content-Type` header value for the encoded body.
    pub fn content_type(&self) -> String {
        boundary::content_type(self.boundary())
    }

    /// Encodes all parts. Repeated calls produce identical bytes.
    pub fn encode(&self) -> Bytes {
        codec::encode(self.boundary(), &self.parts).freeze()
    }

    /// Decodes a body using the boundary declared in `content_type`.
    pub fn decode(body: &[u8], content_type: &str) -> Result<Self, DecodingError> {
        Self::decode_with_limits(body, content_type, &DecodeLimits::default())
    }

    /// Like [`FormData::decode`], rejecting bodies that exceed `limits`.
    pub fn decode_with_limits(
        body: &[u8],
        content_type: &str,
        limits: &DecodeLimits,
    ) -> Result<Self, DecodingError> {
        let boundary = boundary::parse_content_type(content_type)?;
        let parts = codec::decode(body, &boundary, limits)?;
        Ok(Self {
            boundary: OnceLock::from(boundary),
            parts,
        })
    }

    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<BodyPart> {
        self.parts
    }

    /// Returns the first part named `name`.
    pub fn get(&self, name: &str) -> Option<&BodyPart> {
        self.parts.iter().find(|p| p.name() == name)
    }

    /// Returns every part named `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a BodyPart> + 'a {
        self.parts.iter().filter(move |p| p.name() == name)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BodyPart> {
        self.parts.iter()
    }
}

impl IntoIterator for FormData {
    type Item = BodyPart;
    type IntoIter = std::vec::IntoIter<BodyPart>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.into_iter()
    }
}

impl<'a> IntoIterator for &'a FormData {
    type Item = &'a BodyPart;
    type IntoIter = std::slice::Iter<'a, BodyPart>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::JsonBody;
    use crate::{CONTENT_DISPOSITION, CONTENT_TYPE, MULTIPART_FORM_DATA};
    use proptest::prelude::*;
    use std::borrow::Cow;
    use std::collections::BTreeMap;

    fn encoded_text(form: &FormData) -> String {
        String::from_utf8_lossy(&form.encode()).into_owned()
    }

    #[derive(Serialize)]
    struct CustomValue {
        id: u32,
        name: String,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "snake_case")]
    struct CustomRequestBody {
        id: u32,
        custom_property: String,
    }

    #[test]
    fn test_append_text() {
        let mut form = FormData::new();
        form.append_text("name", "John Doe");

        let text = encoded_text(&form);
        assert!(text.contains("name=\"name\""));
        assert!(text.contains("John Doe"));
        assert!(form.get("name").unwrap().content_type().is_none());
    }

    #[test]
    fn test_append_binary_headers() {
        let mut form = FormData::new();
        form.append_binary("image", vec![0xFFu8, 0xD8, 0xFF, 0xE0], "test.jpg", "image/jpeg");

        let part = form.get("image").unwrap();
        assert!(part
            .headers()
            .get(CONTENT_DISPOSITION)
            .unwrap()
            .contains("filename=\"test.jpg\""));
        assert_eq!(part.headers().get(CONTENT_TYPE), Some("image/jpeg"));

        let text = encoded_text(&form);
        assert!(text.contains("name=\"image\""));
        assert!(text.contains("Content-Type: image/jpeg\r\n"));
    }

    #[test]
    fn test_append_multiple_preserves_order() {
        let mut form = FormData::new();
        form.append_text("key1", "value1");
        form.append_text("key2", "value2");

        let text = encoded_text(&form);
        let first = text.find("name=\"key1\"").unwrap();
        let second = text.find("name=\"key2\"").unwrap();
        assert!(first < second);
        assert!(text.contains("value1"));
        assert!(text.contains("value2"));
    }

    #[test]
    fn test_duplicate_names_kept() {
        let mut form = FormData::new();
        form.append_text("tag", "a");
        form.append_text("tag", "b");

        assert_eq!(form.len(), 2);
        let values: Vec<&str> = form.get_all("tag").filter_map(|p| p.text()).collect();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn test_content_type_prefix() {
        let form = FormData::new();
        assert!(form
            .content_type()
            .starts_with("multipart/form-data; boundary="));
    }

    #[test]
    fn test_content_type_matches_encoded_boundary() {
        let mut form = FormData::new();
        form.append_text("a", "1");

        let content_type = form.content_type();
        let boundary = content_type
            .strip_prefix(&format!("{}; boundary=", MULTIPART_FORM_DATA))
            .unwrap();
        assert_eq!(boundary, form.boundary());

        let encoded = form.encode();
        assert!(encoded.starts_with(format!("--{}\r\n", boundary).as_bytes()));
        assert!(encoded.ends_with(format!("--{}--\r\n", boundary).as_bytes()));
    }

    #[test]
    fn test_encode_idempotent() {
        let mut form = FormData::new();
        form.append_text("a", "1");
        form.append_binary("f", vec![1u8, 2, 3], "f.bin", "application/octet-stream");

        assert_eq!(form.encode(), form.encode());
    }

    #[test]
    fn test_clone_keeps_boundary() {
        let form = FormData::new();
        let boundary = form.boundary().to_string();
        let copy = form.clone();
        assert_eq!(copy.boundary(), boundary);
    }

    #[test]
    fn test_with_boundary() {
        let mut form = FormData::with_boundary("fixed").unwrap();
        form.append_text("a", "1");

        assert_eq!(form.content_type(), "multipart/form-data; boundary=fixed");
        assert!(form.encode().starts_with(b"--fixed\r\n"));

        assert!(FormData::with_boundary("").is_err());
    }

    #[test]
    fn test_append_json() {
        let mut form = FormData::new();
        form.append_json(
            "custom",
            &CustomValue {
                id: 123,
                name: "Test".into(),
            },
        )
        .unwrap();

        let part = form.get("custom").unwrap();
        assert_eq!(part.content_type(), Some(APPLICATION_JSON));

        let text = encoded_text(&form);
        assert!(text.contains("name=\"custom\""));
        assert!(text.contains("\"id\":123"));
        assert!(text.contains("\"name\":\"Test\""));
    }

    #[test]
    fn test_append_json_failure_leaves_form_unchanged() {
        // JSON object keys must be strings
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], 1);

        let mut form = FormData::new();
        form.append_text("a", "1");
        let result = form.append_json("bad", &map);

        assert!(matches!(result, Err(EncodingError::Json(_))));
        assert_eq!(form.len(), 1);
    }

    #[test]
    fn test_append_body_snake_case() {
        let mut form = FormData::new();
        let body = JsonBody::new(CustomRequestBody {
            id: 123,
            custom_property: "Test".into(),
        });
        form.append_body("custom", &body).unwrap();

        let text = encoded_text(&form);
        assert!(text.contains("name=\"custom\""));
        assert!(text.contains("\"id\":123"));
        assert!(text.contains("\"custom_property\":\"Test\""));
        assert_eq!(
            form.get("custom").unwrap().content_type(),
            Some(APPLICATION_JSON)
        );
    }

    struct Failing;

    impl RequestBody for Failing {
        fn content_type(&self) -> Cow<'static, str> {
            Cow::Borrowed("text/plain")
        }

        fn encode_body(&self) -> Result<Vec<u8>, EncodingError> {
            Err(EncodingError::Body("refused".into()))
        }
    }

    #[test]
    fn test_append_body_failure() {
        let mut form = FormData::new();
        let result = form.append_body("x", &Failing);
        assert!(matches!(result, Err(EncodingError::Body(_))));
        assert!(form.is_empty());
    }

    #[test]
    fn test_append_params() {
        let mut form = FormData::new();
        form.append_params("params", &SearchParams::parse("foo=bar&baz=foo"));

        let text = encoded_text(&form);
        assert!(text.contains("name=\"params\""));
        assert!(text.contains("foo=bar&baz=foo"));
        assert!(form.get("params").unwrap().content_type().is_none());
    }

    #[test]
    fn test_decode_roundtrip() {
        let mut original = FormData::new();
        original.append_text("name", "John Doe");
        original.append_text("email", "john@example.com");

        let decoded = FormData::decode(&original.encode(), &original.content_type()).unwrap();
        assert_eq!(decoded.boundary(), original.boundary());
        assert_eq!(decoded.get("name").unwrap().text(), Some("John Doe"));
        assert_eq!(
            decoded.get("email").unwrap().text(),
            Some("john@example.com")
        );

        // re-encoding reproduces the original body
        assert_eq!(decoded.encode(), original.encode());
    }

    #[test]
    fn test_decode_binary_content() {
        let binary: Vec<u8> = (0..=255u8).collect();

        let mut original = FormData::new();
        original.append_binary("file", binary.clone(), "test.bin", "application/octet-stream");

        let decoded = FormData::decode(&original.encode(), &original.content_type()).unwrap();
        let part = decoded.parts().first().unwrap();
        assert_eq!(
            part.headers().get(CONTENT_TYPE),
            Some("application/octet-stream")
        );
        assert!(part
            .headers()
            .get(CONTENT_DISPOSITION)
            .unwrap()
            .contains("filename=\"test.bin\""));
        assert_eq!(&part.data()[..], &binary[..]);
    }

    #[test]
    fn test_decode_without_boundary_fails() {
        let result = FormData::decode(b"whatever", MULTIPART_FORM_DATA);
        assert!(matches!(result, Err(DecodingError::MissingBoundary)));
    }

    #[test]
    fn test_decode_with_limits() {
        let mut form = FormData::new();
        form.append_text("a", "1");
        form.append_text("b", "2");

        let limits = DecodeLimits::new().with_max_parts(1);
        let result = FormData::decode_with_limits(&form.encode(), &form.content_type(), &limits);
        assert!(matches!(result, Err(DecodingError::TooManyParts { .. })));
    }

    #[test]
    fn test_append_part_with_extra_header() {
        let part = BodyPart::new("doc", Some("a.txt".into()), Some("text/plain".into()), "hi")
            .with_header("Content-Transfer-Encoding", "binary");

        let mut form = FormData::with_boundary("b").unwrap();
        form.append_part(part);

        let text = encoded_text(&form);
        let disposition = text.find(CONTENT_DISPOSITION).unwrap();
        let content_type = text.find("Content-Type: text/plain").unwrap();
        let extra = text.find("Content-Transfer-Encoding: binary").unwrap();
        assert!(disposition < content_type && content_type < extra);

        let decoded = FormData::decode(&form.encode(), &form.content_type()).unwrap();
        let part = decoded.get("doc").unwrap();
        assert_eq!(
            part.headers().get("content-transfer-encoding"),
            Some("binary")
        );
        assert_eq!(part.text(), Some("hi"));
    }

    #[test]
    fn test_disposition_override_still_roundtrips() {
        let part = BodyPart::new("avatar", Some("a.png".into()), None, "x")
            .with_header("content-disposition", "attachment");

        let mut form = FormData::with_boundary("b").unwrap();
        form.append_part(part);

        let decoded = FormData::decode(&form.encode(), &form.content_type()).unwrap();
        let part = decoded.get("avatar").unwrap();
        assert_eq!(part.filename(), Some("a.png"));
        assert_eq!(part.text(), Some("x"));
    }

    #[test]
    fn test_injected_content_type_stays_one_header() {
        let mut form = FormData::with_boundary("b").unwrap();
        form.append_binary("f", "x", "a.txt", "text/plain\r\nX-Injected: 1");

        let decoded = FormData::decode(&form.encode(), &form.content_type()).unwrap();
        let part = decoded.get("f").unwrap();
        assert!(!part.headers().contains("X-Injected"));
        assert_eq!(part.headers().len(), 2);
    }

    #[test]
    fn test_with_boundary_rejects_invalid() {
        let result = FormData::with_boundary("has space");
        assert!(matches!(result, Err(EncodingError::InvalidBoundary(_))));
        assert_eq!(
            result.unwrap_err().code(),
            crate::error::ErrorCode::InvalidBoundary
        );
    }

    #[test]
    fn test_iteration() {
        let mut form = FormData::new();
        form.append_text("a", "1");
        form.append_text("b", "2");

        let names: Vec<&str> = (&form).into_iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let owned: Vec<BodyPart> = form.into_iter().collect();
        assert_eq!(owned.len(), 2);
    }

    #[derive(Debug, Clone)]
    enum Field {
        Text(String, String),
        File(String, Vec<u8>, String, String),
    }

    fn field_strategy() -> impl Strategy<Value = Field> {
        let name = "[a-z][a-z0-9_]{0,11}";
        prop_oneof![
            (name, ".{0,40}").prop_map(|(n, v)| Field::Text(n, v)),
            (
                name,
                proptest::collection::vec(any::<u8>(), 0..256),
                "[a-z]{1,8}\\.[a-z]{1,3}",
                "(application|image|text)/[a-z]{1,10}",
            )
                .prop_map(|(n, d, f, t)| Field::File(n, d, f, t)),
        ]
    }

    proptest! {
        #[test]
        fn prop_text_and_binary_roundtrip(fields in proptest::collection::vec(field_strategy(), 0..8)) {
            let mut form = FormData::new();
            for field in &fields {
                match field.clone() {
                    Field::Text(name, value) => form.append_text(name, value),
                    Field::File(name, data, filename, content_type) => {
                        form.append_binary(name, data, filename, content_type)
                    }
                }
            }

            let decoded = FormData::decode(&form.encode(), &form.content_type()).unwrap();
            prop_assert_eq!(decoded.len(), form.len());
            for (a, b) in form.iter().zip(decoded.iter()) {
                prop_assert_eq!(a.name(), b.name());
                prop_assert_eq!(a.filename(), b.filename());
                prop_assert_eq!(a.content_type(), b.content_type());
                prop_assert_eq!(a.data(), b.data());
            }
        }
    }
}
