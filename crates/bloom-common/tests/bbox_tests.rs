//! Tests for BoundingBox operations.

use bloom_common::bbox::{BboxParseError, BoundingBox};

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-121.5, 38.2, -121.0, 38.6);
    assert_eq!(bbox.min_x, -121.5);
    assert_eq!(bbox.min_y, 38.2);
    assert_eq!(bbox.max_x, -121.0);
    assert_eq!(bbox.max_y, 38.6);
}

#[test]
fn test_bbox_from_array() {
    let bbox = BoundingBox::from([0.0, 1.0, 2.0, 3.0]);
    assert_eq!(bbox.to_array(), [0.0, 1.0, 2.0, 3.0]);
}

// ============================================================================
// Parsing tests
// ============================================================================

#[test]
fn test_parse_with_whitespace() {
    let bbox: BoundingBox = " -121.5, 38.2 ,-121.0,38.6".parse().unwrap();
    assert_eq!(bbox.min_x, -121.5);
    assert_eq!(bbox.max_y, 38.6);
}

#[test]
fn test_parse_wrong_count() {
    let err = "1,2,3".parse::<BoundingBox>().unwrap_err();
    assert!(matches!(err, BboxParseError::InvalidFormat(_)));
}

#[test]
fn test_parse_bad_number() {
    let err = "1,2,x,4".parse::<BoundingBox>().unwrap_err();
    assert!(matches!(err, BboxParseError::InvalidNumber(ref s) if s == "x"));
}

#[test]
fn test_deserialize_rejects_short_array() {
    assert!(serde_json::from_str::<BoundingBox>("[1.0, 2.0, 3.0]").is_err());
}

// ============================================================================
// Geometry tests
// ============================================================================

#[test]
fn test_width_height_center() {
    let bbox = BoundingBox::new(-121.5, 38.2, -121.0, 38.6);
    assert!((bbox.width() - 0.5).abs() < 1e-12);
    assert!((bbox.height() - 0.4).abs() < 1e-12);
    let (cx, cy) = bbox.center();
    assert!((cx - (-121.25)).abs() < 1e-12);
    assert!((cy - 38.4).abs() < 1e-12);
}

#[test]
fn test_contains_point_edges_inclusive() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    assert!(bbox.contains_point(0.0, 0.0));
    assert!(bbox.contains_point(10.0, 10.0));
    assert!(bbox.contains_point(5.0, 5.0));
    assert!(!bbox.contains_point(10.0001, 5.0));
    assert!(!bbox.contains_point(5.0, -0.0001));
}

#[test]
fn test_intersects() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
    let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
    let touching = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
    assert!(!a.intersects(&touching));
}

#[test]
fn test_validity() {
    assert!(BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_valid());
    assert!(!BoundingBox::new(1.0, 0.0, 1.0, 1.0).is_valid());
    assert!(!BoundingBox::new(0.0, 0.0, f64::NAN, 1.0).is_valid());
}
