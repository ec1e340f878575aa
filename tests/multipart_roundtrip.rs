//! Round-trip property of the multipart decoder over constructed bodies.

mod common;

use pretty_assertions::assert_eq;

use rolo::multipart::{boundary_from_content_type, parse};

const BOUNDARY: &str = "----RoloFormBoundaryXyZ123";

#[test]
fn mixed_fields_and_files_round_trip() {
    let png = common::test_png(120, 80);
    let body = common::multipart_body(
        BOUNDARY,
        &[
            ("notes", None, None, b"met at the expo"),
            ("image", Some("front.png"), Some("image/png"), &png),
            ("tags", None, None, b"expo,berlin"),
            ("images", Some("back.png"), Some("image/png"), &png),
        ],
    );

    let parts = parse(&body, BOUNDARY).expect("parse");
    assert_eq!(parts.len(), 4);

    assert_eq!(parts[0].name, "notes");
    assert!(!parts[0].is_file());
    assert_eq!(parts[0].text(), "met at the expo");

    assert_eq!(parts[1].name, "image");
    assert!(parts[1].is_file());
    assert_eq!(parts[1].file_name.as_deref(), Some("front.png"));
    assert_eq!(parts[1].content_type.as_deref(), Some("image/png"));
    assert_eq!(parts[1].data, png, "file bytes survive byte-exact");

    assert_eq!(parts[2].text(), "expo,berlin");

    assert_eq!(parts[3].name, "images");
    assert_eq!(parts[3].data, png);
}

#[test]
fn many_parts_keep_order_and_separation() {
    let mut spec: Vec<(String, Option<String>, Option<String>, Vec<u8>)> = Vec::new();
    for i in 0..25 {
        if i % 3 == 0 {
            spec.push((
                "images".to_string(),
                Some(format!("card{i}.png")),
                Some("image/png".to_string()),
                vec![i as u8; 64],
            ));
        } else {
            spec.push((format!("field{i}"), None, None, format!("value{i}").into_bytes()));
        }
    }

    let borrowed: Vec<(&str, Option<&str>, Option<&str>, &[u8])> = spec
        .iter()
        .map(|(n, f, c, d)| (n.as_str(), f.as_deref(), c.as_deref(), d.as_slice()))
        .collect();
    let body = common::multipart_body(BOUNDARY, &borrowed);

    let parts = parse(&body, BOUNDARY).expect("parse");
    assert_eq!(parts.len(), 25);

    for (i, part) in parts.iter().enumerate() {
        if i % 3 == 0 {
            assert!(part.is_file());
            assert_eq!(part.file_name.as_deref(), Some(format!("card{i}.png").as_str()));
            assert_eq!(part.data, vec![i as u8; 64]);
        } else {
            assert_eq!(part.name, format!("field{i}"));
            assert_eq!(part.text(), format!("value{i}"));
        }
    }
}

#[test]
fn boundary_extraction_matches_axum_content_types() {
    let ct = format!("multipart/form-data; boundary={BOUNDARY}");
    assert_eq!(boundary_from_content_type(&ct).as_deref(), Some(BOUNDARY));

    // Browsers may quote the boundary.
    let ct = format!("multipart/form-data; boundary=\"{BOUNDARY}\"");
    assert_eq!(boundary_from_content_type(&ct).as_deref(), Some(BOUNDARY));

    // Charset parameters before the boundary are tolerated.
    let ct = format!("multipart/form-data; charset=utf-8; boundary={BOUNDARY}");
    assert_eq!(boundary_from_content_type(&ct).as_deref(), Some(BOUNDARY));
}

#[test]
fn file_bytes_containing_boundary_like_text_are_not_split() {
    // CRLF-heavy binary content that merely *resembles* part separators.
    let tricky = b"\r\n--not-the-boundary\r\nContent-Disposition: fake\r\n\r\npayload".to_vec();
    let body = common::multipart_body(
        BOUNDARY,
        &[("image", Some("tricky.bin"), Some("application/octet-stream"), &tricky)],
    );

    let parts = parse(&body, BOUNDARY).expect("parse");
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].data, tricky);
}
