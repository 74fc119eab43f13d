//! EPSG-to-EPSG point and bbox transforms backed by proj4rs.

use bloom_common::{BoundingBox, Epsg};
use proj4rs::proj::Proj;

use crate::error::ProjectionError;

/// PROJ.4 definition for an EPSG code.
pub fn proj_string(epsg: Epsg) -> Option<&'static str> {
    crs_definitions::from_code(epsg.code()).map(|def| def.proj4)
}

/// Whether an EPSG code uses longitude/latitude axes.
pub fn is_geographic(epsg: Epsg) -> bool {
    match proj_string(epsg) {
        Some(def) => def.contains("+proj=longlat"),
        None => epsg.is_wgs84() || (4000..5000).contains(&epsg.code()),
    }
}

/// A prepared transform between two coordinate systems.
///
/// Geographic coordinates are taken and returned in degrees. When source and
/// target are the same code the transformer is an identity and never touches
/// proj4rs.
pub struct CrsTransformer {
    from: Epsg,
    to: Epsg,
    inner: Option<Prepared>,
}

struct Prepared {
    source: Proj,
    target: Proj,
    source_geographic: bool,
    target_geographic: bool,
}

impl CrsTransformer {
    pub fn new(from: Epsg, to: Epsg) -> Result<Self, ProjectionError> {
        if from == to {
            return Ok(Self {
                from,
                to,
                inner: None,
            });
        }

        Ok(Self {
            from,
            to,
            inner: Some(Prepared {
                source: load(from)?,
                target: load(to)?,
                source_geographic: is_geographic(from),
                target_geographic: is_geographic(to),
            }),
        })
    }

    pub fn source(&self) -> Epsg {
        self.from
    }

    pub fn target(&self) -> Epsg {
        self.to
    }

    pub fn is_identity(&self) -> bool {
        self.inner.is_none()
    }

    /// Transform a single point.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        let prepared = match &self.inner {
            None => return Ok((x, y)),
            Some(p) => p,
        };

        let mut point = if prepared.source_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        proj4rs::transform::transform(&prepared.source, &prepared.target, &mut point).map_err(
            |e| ProjectionError::TransformFailed {
                from: self.from,
                to: self.to,
                x,
                y,
                message: format!("{:?}", e),
            },
        )?;

        let (out_x, out_y) = if prepared.target_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(ProjectionError::TransformFailed {
                from: self.from,
                to: self.to,
                x,
                y,
                message: "non-finite result".to_string(),
            });
        }

        Ok((out_x, out_y))
    }

    /// Envelope of the four transformed corners of `bbox`.
    pub fn transform_bbox(&self, bbox: &BoundingBox) -> Result<BoundingBox, ProjectionError> {
        if self.is_identity() {
            return Ok(*bbox);
        }

        let corners = [
            (bbox.min_x, bbox.min_y),
            (bbox.max_x, bbox.min_y),
            (bbox.min_x, bbox.max_y),
            (bbox.max_x, bbox.max_y),
        ];

        let mut out = BoundingBox::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for (x, y) in corners {
            let (tx, ty) = self.transform(x, y)?;
            out.min_x = out.min_x.min(tx);
            out.min_y = out.min_y.min(ty);
            out.max_x = out.max_x.max(tx);
            out.max_y = out.max_y.max(ty);
        }
        Ok(out)
    }
}

fn load(epsg: Epsg) -> Result<Proj, ProjectionError> {
    let def = proj_string(epsg).ok_or(ProjectionError::UnknownCrs(epsg))?;
    Proj::from_proj_string(def).map_err(|e| ProjectionError::InvalidDefinition {
        epsg,
        message: format!("{:?}", e),
    })
}
