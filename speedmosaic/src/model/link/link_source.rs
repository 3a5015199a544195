use super::{Link, LinkDirection, LinkId};
use crate::model::DatasetError;
use geo::{Coord, Geometry, LineString};
use kdam::tqdm;
use serde::{Deserialize, Serialize};
use shapefile::dbase::FieldValue;
use std::path::Path;
use wkt::TryFromWkt;

/// attribute names used when reading link attributes from a shapefile.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct LinkFieldNames {
    pub id_field: String,
    pub direction_field: String,
    pub speed_field: String,
}

impl Default for LinkFieldNames {
    fn default() -> Self {
        Self {
            id_field: String::from("link_id"),
            direction_field: String::from("direction"),
            speed_field: String::from("speed_kph"),
        }
    }
}

/// source of a link geometry dataset
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum LinkSource {
    /// CSV file with `link_id`, `geometry` (WKT) and optional `direction`, `speed_kph` columns
    Csv { file: String },
    /// ESRI shapefile with polyline shapes and attributes named by [LinkFieldNames]
    Shapefile { file: String, fields: LinkFieldNames },
}

/// counts of a link dataset read, retained for diagnostics.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkLoadSummary {
    pub rows_read: usize,
    pub loaded: usize,
    pub skipped: usize,
}

/// a row of a link CSV dataset
#[derive(Deserialize, Debug)]
struct LinkRow {
    link_id: String,
    geometry: String,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    speed_kph: Option<f64>,
}

impl LinkSource {
    /// selects a source adapter by file extension.
    pub fn from_path(path: &Path, fields: &LinkFieldNames) -> Result<LinkSource, DatasetError> {
        let file = path.to_string_lossy().to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match extension.as_deref() {
            Some("csv") => Ok(LinkSource::Csv { file }),
            Some("shp") => Ok(LinkSource::Shapefile {
                file,
                fields: fields.clone(),
            }),
            _ => Err(DatasetError::UnsupportedFormat(
                file,
                String::from(".csv, .shp"),
            )),
        }
    }

    pub fn file(&self) -> &str {
        match self {
            LinkSource::Csv { file } => file,
            LinkSource::Shapefile { file, .. } => file,
        }
    }

    /// reads each record of the source. records that fail to parse are returned as
    /// errors alongside their row index so the caller can skip and count them.
    pub fn read(&self) -> Result<Vec<Result<Link, String>>, DatasetError> {
        let file = self.file();
        if !Path::new(file).exists() {
            return Err(DatasetError::DatasetNotFound(file.to_string()));
        }
        match self {
            LinkSource::Csv { file } => read_link_csv(file),
            LinkSource::Shapefile { file, fields } => read_link_shapefile(file, fields),
        }
    }
}

fn read_link_csv(file: &str) -> Result<Vec<Result<Link, String>>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file)
        .map_err(|e| DatasetError::ReadError(file.to_string(), e.to_string()))?;
    let iter = tqdm!(reader.deserialize::<LinkRow>(), desc = "read link csv");
    let rows = iter
        .enumerate()
        .map(|(idx, row)| {
            let row = row.map_err(|e| format!("row {idx}: {e}"))?;
            link_from_csv_row(row).map_err(|e| format!("row {idx}: {e}"))
        })
        .collect::<Vec<_>>();
    eprintln!();
    Ok(rows)
}

fn link_from_csv_row(row: LinkRow) -> Result<Link, String> {
    let geometry: Geometry<f64> = Geometry::try_from_wkt_str(&row.geometry)
        .map_err(|e| format!("invalid WKT geometry: {e}"))?;
    let linestring = match geometry {
        Geometry::LineString(ls) => ls,
        Geometry::Line(l) => LineString::new(vec![l.start, l.end]),
        Geometry::MultiLineString(mls) if mls.0.len() == 1 => mls.0[0].clone(),
        _ => {
            return Err(String::from(
                "geometry must be a LINESTRING or single-part MULTILINESTRING",
            ))
        }
    };
    let direction = match row.direction {
        Some(d) => d.parse::<LinkDirection>()?,
        None => LinkDirection::Both,
    };
    Link::new(LinkId(row.link_id), linestring, direction, row.speed_kph)
}

fn read_link_shapefile(
    file: &str,
    fields: &LinkFieldNames,
) -> Result<Vec<Result<Link, String>>, DatasetError> {
    let rows = shapefile::read(file)
        .map_err(|e| DatasetError::ReadError(file.to_string(), e.to_string()))?;
    let total = rows.len();
    let iter = tqdm!(rows.into_iter(), total = total, desc = "read link shapefile");
    let links = iter
        .enumerate()
        .map(|(idx, (shape, record))| {
            link_from_shape(shape, &record, fields).map_err(|e| format!("row {idx}: {e}"))
        })
        .collect::<Vec<_>>();
    eprintln!();
    Ok(links)
}

fn link_from_shape(
    shape: shapefile::Shape,
    record: &shapefile::dbase::Record,
    fields: &LinkFieldNames,
) -> Result<Link, String> {
    let coords = match shape {
        shapefile::Shape::Polyline(p) => join_parts(p.parts().as_slice(), |pt| (pt.x, pt.y)),
        shapefile::Shape::PolylineM(p) => join_parts(p.parts().as_slice(), |pt| (pt.x, pt.y)),
        shapefile::Shape::PolylineZ(p) => join_parts(p.parts().as_slice(), |pt| (pt.x, pt.y)),
        other => {
            return Err(format!(
                "unexpected shape type {}, must be a polyline",
                other.shapetype()
            ))
        }
    };
    let id = record
        .get(&fields.id_field)
        .and_then(field_as_string)
        .ok_or_else(|| format!("field '{}' missing or empty", fields.id_field))?;
    let direction = match record.get(&fields.direction_field).and_then(field_as_string) {
        Some(d) => d.parse::<LinkDirection>()?,
        None => LinkDirection::Both,
    };
    let speed_kph = record.get(&fields.speed_field).and_then(field_as_f64);
    Link::new(LinkId(id), LineString::new(coords), direction, speed_kph)
}

/// joins the parts of a multi-part polyline in part order.
fn join_parts<P>(parts: &[Vec<P>], xy: impl Fn(&P) -> (f64, f64)) -> Vec<Coord<f64>> {
    parts
        .iter()
        .flat_map(|part| part.iter())
        .map(|p| {
            let (x, y) = xy(p);
            Coord { x, y }
        })
        .collect()
}

fn field_as_string(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(Some(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Numeric(Some(n)) => Some(format_number(*n)),
        FieldValue::Float(Some(f)) => Some(format_number(*f as f64)),
        FieldValue::Double(d) => Some(format_number(*d)),
        _ => None,
    }
}

fn field_as_f64(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Integer(i) => Some(*i as f64),
        FieldValue::Numeric(Some(n)) => Some(*n),
        FieldValue::Float(Some(f)) => Some(*f as f64),
        FieldValue::Double(d) => Some(*d),
        FieldValue::Character(Some(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// numeric ids are stored as floats in dbase files; print integral values without a fraction.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_utils::{ScratchDir, TWO_LINK_CSV};
    use shapefile::{dbase, Point, Polyline};

    #[test]
    fn test_select_by_extension() {
        let fields = LinkFieldNames::default();
        let csv = LinkSource::from_path(Path::new("links.csv"), &fields);
        assert!(matches!(csv, Ok(LinkSource::Csv { .. })));
        let shp = LinkSource::from_path(Path::new("links.SHP"), &fields);
        assert!(matches!(shp, Ok(LinkSource::Shapefile { .. })));
        let other = LinkSource::from_path(Path::new("links.gpkg"), &fields);
        assert!(matches!(other, Err(DatasetError::UnsupportedFormat(_, _))));
    }

    #[test]
    fn test_read_csv_with_bad_rows() {
        let dir = ScratchDir::new("link-source").expect("test invariant failed: scratch dir");
        let contents = format!(
            "{TWO_LINK_CSV}C,\"POINT (0 0)\",both\nD,\"LINESTRING (5 5, 5 5)\",both\nE,\"LINESTRING (2 0, 3 0)\",sideways\n"
        );
        let file = dir
            .write("links.csv", &contents)
            .expect("test invariant failed: write fixture");
        let source = LinkSource::Csv {
            file: file.to_string_lossy().to_string(),
        };
        let rows = source.read().expect("read should succeed");
        assert_eq!(rows.len(), 5);
        let ok = rows.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 2);
    }

    #[test]
    fn test_missing_file() {
        let source = LinkSource::Csv {
            file: String::from("/definitely/not/here/links.csv"),
        };
        assert!(matches!(
            source.read(),
            Err(DatasetError::DatasetNotFound(_))
        ));
    }

    fn field(name: &str) -> dbase::FieldName {
        dbase::FieldName::try_from(name).expect("test invariant failed: field name too long")
    }

    fn record(id: FieldValue, direction: &str) -> dbase::Record {
        let mut record = dbase::Record::default();
        record.insert(String::from("link_id"), id);
        record.insert(
            String::from("direction"),
            FieldValue::Character(Some(direction.to_string())),
        );
        record
    }

    #[test]
    fn test_read_polyline_shapefile() {
        let dir = ScratchDir::new("link-source").expect("test invariant failed: scratch dir");
        let file = dir.path().join("links.shp");
        let table = dbase::TableWriterBuilder::new()
            .add_numeric_field(field("link_id"), 10, 0)
            .add_character_field(field("direction"), 10);
        {
            let mut writer = shapefile::Writer::from_path(&file, table)
                .expect("test invariant failed: shapefile writer");
            let single = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
            let multi = Polyline::with_parts(vec![
                vec![Point::new(1.0, 0.0), Point::new(1.5, 0.0)],
                vec![Point::new(1.5, 0.0), Point::new(2.0, 0.0)],
            ]);
            let bad_direction = Polyline::new(vec![Point::new(2.0, 0.0), Point::new(3.0, 0.0)]);
            let rows = [
                (single, record(FieldValue::Numeric(Some(1001.0)), "forward")),
                (multi, record(FieldValue::Numeric(Some(1002.0)), "both")),
                (bad_direction, record(FieldValue::Numeric(Some(1003.0)), "sideways")),
            ];
            for (shape, rec) in rows.iter() {
                writer
                    .write_shape_and_record(shape, rec)
                    .expect("test invariant failed: write shape");
            }
        }

        let source = LinkSource::from_path(&file, &LinkFieldNames::default())
            .expect("shp extension should be supported");
        let rows = source.read().expect("read should succeed");
        assert_eq!(rows.len(), 3);
        let links = rows.into_iter().filter_map(Result::ok).collect::<Vec<_>>();
        assert_eq!(links.len(), 2);

        assert_eq!(links[0].id, LinkId::from("1001"));
        assert_eq!(links[0].direction, LinkDirection::Forward);
        assert_eq!(links[1].id, LinkId::from("1002"));
        assert_eq!(links[1].direction, LinkDirection::Both);
        let joined = links[1].geometry.0.iter().map(|c| (c.x, c.y)).collect::<Vec<_>>();
        assert_eq!(joined, vec![(1.0, 0.0), (1.5, 0.0), (2.0, 0.0)]);
    }

    #[test]
    fn test_point_shapefile_records_skipped() {
        let dir = ScratchDir::new("link-source").expect("test invariant failed: scratch dir");
        let file = dir.path().join("points.shp");
        let table = dbase::TableWriterBuilder::new()
            .add_numeric_field(field("link_id"), 10, 0)
            .add_character_field(field("direction"), 10);
        {
            let mut writer = shapefile::Writer::from_path(&file, table)
                .expect("test invariant failed: shapefile writer");
            writer
                .write_shape_and_record(
                    &Point::new(0.0, 0.0),
                    &record(FieldValue::Numeric(Some(7.0)), "both"),
                )
                .expect("test invariant failed: write shape");
        }
        let source = LinkSource::Shapefile {
            file: file.to_string_lossy().to_string(),
            fields: LinkFieldNames::default(),
        };
        let rows = source.read().expect("read should succeed");
        assert_eq!(rows.len(), 1);
        let err = rows[0].as_ref().expect_err("point shapes are not links");
        assert!(err.contains("polyline"), "unexpected message {err}");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234.0), "1234");
        assert_eq!(format_number(1.5), "1.5");
    }
}
