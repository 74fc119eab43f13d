//! Band alignment over GeoTIFF fixtures held in an in-memory object store.

use std::sync::Arc;

use bytes::Bytes;
use object_store::{memory::InMemory, path::Path, ObjectStore};

use bloom_common::{BloomError, BoundingBox, Epsg, Scene, SceneAsset};
use ingestion::{BandAligner, ObjectStoreSource, ReprojectionPolicy};
use test_utils::geotiff::{encode_u16, encode_u8, GeoTiffSpec};

// ============================================================================
// Fixtures
// ============================================================================

const FINE: f64 = 1.0 / 128.0;
const COARSE: f64 = 1.0 / 64.0;

fn wgs84_spec(width: u32, height: u32, pixel_size: f64) -> GeoTiffSpec {
    GeoTiffSpec {
        width,
        height,
        origin_x: -121.625,
        origin_y: 38.75,
        pixel_size,
        epsg: 4326,
    }
}

async fn put(store: &Arc<dyn ObjectStore>, path: &str, bytes: Vec<u8>) {
    store
        .put(&Path::from(path), Bytes::from(bytes).into())
        .await
        .unwrap();
}

/// B03 at 1/128 degree, B05 and SCL at 1/64 degree, same extent.
async fn wgs84_store() -> Arc<dyn ObjectStore> {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put(
        &store,
        "scene/green.tif",
        encode_u16(&wgs84_spec(128, 96, FINE), &vec![1200u16; 128 * 96]),
    )
    .await;
    put(
        &store,
        "scene/rededge1.tif",
        encode_u16(&wgs84_spec(64, 48, COARSE), &vec![1500u16; 64 * 48]),
    )
    .await;
    let scl: Vec<u8> = (0..64 * 48).map(|i| if i % 2 == 0 { 4 } else { 9 }).collect();
    put(&store, "scene/scl.tif", encode_u8(&wgs84_spec(64, 48, COARSE), &scl)).await;
    store
}

fn scene(names: &[&str]) -> Scene {
    Scene {
        id: "S2B_10SFH_20250901_0_L2A".to_string(),
        cloud_cover: Some(3.2),
        assets: names
            .iter()
            .map(|n| {
                (
                    n.to_string(),
                    SceneAsset {
                        href: format!("scene/{}.tif", n),
                        media_type: None,
                    },
                )
            })
            .collect(),
        bbox: None,
        datetime: None,
    }
}

fn delta_bbox() -> BoundingBox {
    BoundingBox::new(-121.5, 38.2, -121.0, 38.6)
}

// ============================================================================
// Alignment
// ============================================================================

#[tokio::test]
async fn test_align_mixed_resolution_bands() {
    let source = Arc::new(ObjectStoreSource::with_store(wgs84_store().await));
    let aligner = BandAligner::new(source, ReprojectionPolicy::Fail);

    let bands = aligner
        .align(&scene(&["green", "rededge1", "scl"]), &delta_bbox())
        .await
        .unwrap();

    let geometry = *bands.primary.geometry();
    assert_eq!(geometry.shape(), (64, 52));
    assert_eq!(geometry.origin_x, -121.5);
    assert_eq!(geometry.origin_y, 38.75 - 19.0 * FINE);
    assert_eq!(geometry.pixel_size, FINE);
    assert_eq!(geometry.crs, Epsg::WGS84);

    assert_eq!(bands.secondary.geometry(), &geometry);
    assert_eq!(bands.classification.geometry(), &geometry);

    assert!(bands.primary.data().iter().all(|&v| v == 1200.0));
    assert!(bands
        .secondary
        .data()
        .iter()
        .all(|&v| (v - 1500.0).abs() < 1e-3));
    assert!(bands
        .classification
        .data()
        .iter()
        .all(|&c| c == 4 || c == 9));
}

#[tokio::test]
async fn test_missing_classification_band() {
    let source = Arc::new(ObjectStoreSource::with_store(wgs84_store().await));
    let aligner = BandAligner::new(source, ReprojectionPolicy::Fail);

    match aligner
        .align(&scene(&["green", "rededge1"]), &delta_bbox())
        .await
    {
        Err(BloomError::MissingBand { scene_id, missing }) => {
            assert_eq!(scene_id, "S2B_10SFH_20250901_0_L2A");
            assert_eq!(missing, vec!["SCL".to_string()]);
        }
        other => panic!("expected MissingBand, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_unreadable_asset_is_raster_read() {
    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put(&store, "scene/green.tif", b"not a tiff".to_vec()).await;
    put(&store, "scene/rededge1.tif", b"not a tiff".to_vec()).await;
    put(&store, "scene/scl.tif", b"not a tiff".to_vec()).await;

    let aligner = BandAligner::new(
        Arc::new(ObjectStoreSource::with_store(store)),
        ReprojectionPolicy::Fail,
    );
    let err = aligner
        .align(&scene(&["green", "rededge1", "scl"]), &delta_bbox())
        .await
        .unwrap_err();
    assert!(matches!(err, BloomError::RasterRead { .. }));
}

// ============================================================================
// Projected rasters
// ============================================================================

#[tokio::test]
async fn test_align_utm_bands() {
    // 40 m / 80 m UTM 10N rasters around the AOI.
    let utm = |width: u32, height: u32, pixel_size: f64| GeoTiffSpec {
        width,
        height,
        origin_x: 590_000.0,
        origin_y: 4_270_000.0,
        pixel_size,
        epsg: 32610,
    };

    let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
    put(
        &store,
        "scene/B03.tif",
        encode_u16(&utm(500, 625, 40.0), &vec![900u16; 500 * 625]),
    )
    .await;
    put(
        &store,
        "scene/B05.tif",
        encode_u16(&utm(250, 313, 80.0), &vec![1100u16; 250 * 313]),
    )
    .await;
    put(
        &store,
        "scene/SCL.tif",
        encode_u8(&utm(250, 313, 80.0), &vec![5u8; 250 * 313]),
    )
    .await;

    let aligner = BandAligner::new(
        Arc::new(ObjectStoreSource::with_store(store)),
        ReprojectionPolicy::Fail,
    );
    let aoi = BoundingBox::new(-121.9, 38.4, -121.8, 38.5);
    let bands = aligner
        .align(&scene(&["B03", "B05", "SCL"]), &aoi)
        .await
        .unwrap();

    let geometry = bands.primary.geometry();
    assert_eq!(geometry.crs, Epsg(32610));
    assert_eq!(geometry.pixel_size, 40.0);
    // About 8.9 km by 11.1 km at 40 m.
    assert!(geometry.width > 200 && geometry.width < 250, "width {}", geometry.width);
    assert!(geometry.height > 260 && geometry.height < 310, "height {}", geometry.height);
    assert_eq!(bands.secondary.shape(), geometry.shape());
    assert!(bands
        .secondary
        .data()
        .iter()
        .all(|&v| (v - 1100.0).abs() < 1e-3));
    assert!(bands.classification.data().iter().all(|&c| c == 5));
}
