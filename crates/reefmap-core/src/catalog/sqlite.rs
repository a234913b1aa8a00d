//! Relational backend on SQLite.
//!
//! Rows mirror `ImageRecord`, keyed by a UUID with a unique filename.
//! Coordinates are stored as REAL so floats round-trip exactly; the
//! camera-native datetime strings are kept verbatim next to a parsed
//! `captured_at` timestamp used for ordering queries.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{CatalogError, CatalogResult};
use crate::types::{CatalogStats, FavoriteLocation, ImageRecord, LocationInput, LocationPatch};

use super::{check_location, manual_coordinates, CatalogStore, ImageFilter};

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS images (
    id TEXT PRIMARY KEY,
    filename TEXT UNIQUE NOT NULL,
    path TEXT,
    width INTEGER,
    height INTEGER,
    make TEXT,
    model TEXT,
    datetime TEXT,
    datetimeoriginal TEXT,
    captured_at TEXT,
    latitude REAL CHECK (latitude BETWEEN -90 AND 90),
    longitude REAL CHECK (longitude BETWEEN -180 AND 180),
    manually_tagged BOOLEAN NOT NULL DEFAULT 0,
    error TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK ((latitude IS NULL) = (longitude IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_images_captured_at ON images(captured_at);

CREATE TABLE IF NOT EXISTS locations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    latitude REAL NOT NULL CHECK (latitude BETWEEN -90 AND 90),
    longitude REAL NOT NULL CHECK (longitude BETWEEN -180 AND 180),
    description TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

const IMAGE_COLUMNS: &str = "filename, path, width, height, make, model, datetime, \
     datetimeoriginal, latitude, longitude, manually_tagged, error";

const CAMERA_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Catalog stored in a SQLite database file.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> CatalogResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    /// A throwaway in-memory catalog.
    pub fn open_in_memory() -> CatalogResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> CatalogResult<Self> {
        conn.execute_batch(SCHEMA_V1)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        // a panic mid-statement leaves nothing half-applied in SQLite
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Parse a camera-native timestamp into an ISO-8601 string.
fn captured_at(record: &ImageRecord) -> Option<String> {
    record
        .datetimeoriginal
        .as_deref()
        .or(record.datetime.as_deref())
        .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), CAMERA_DATETIME_FORMAT).ok())
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn upsert(conn: &Connection, record: &ImageRecord, now: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO images (id, filename, path, width, height, make, model, datetime,
             datetimeoriginal, captured_at, latitude, longitude, manually_tagged, error,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
         ON CONFLICT(filename) DO UPDATE SET
             path = excluded.path,
             width = excluded.width,
             height = excluded.height,
             make = excluded.make,
             model = excluded.model,
             datetime = excluded.datetime,
             datetimeoriginal = excluded.datetimeoriginal,
             captured_at = excluded.captured_at,
             latitude = excluded.latitude,
             longitude = excluded.longitude,
             manually_tagged = excluded.manually_tagged,
             error = excluded.error,
             updated_at = excluded.updated_at",
        params![
            uuid::Uuid::new_v4().to_string(),
            record.filename,
            record.path,
            record.width,
            record.height,
            record.make,
            record.model,
            record.datetime,
            record.datetimeoriginal,
            captured_at(record),
            record.latitude,
            record.longitude,
            record.manually_tagged,
            record.error,
            now,
        ],
    )?;
    Ok(())
}

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<ImageRecord> {
    let mut record = ImageRecord {
        filename: row.get(0)?,
        path: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        width: row.get(2)?,
        height: row.get(3)?,
        make: row.get(4)?,
        model: row.get(5)?,
        datetime: row.get(6)?,
        datetimeoriginal: row.get(7)?,
        latitude: row.get(8)?,
        longitude: row.get(9)?,
        manually_tagged: row.get(10)?,
        error: row.get(11)?,
    };
    record.normalize_coordinates();
    Ok(record)
}

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<FavoriteLocation> {
    let created_at: String = row.get(5)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);
    Ok(FavoriteLocation {
        id: row.get(0)?,
        name: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        description: row.get(4)?,
        created_at,
    })
}

fn find_location(conn: &Connection, id: &str) -> CatalogResult<FavoriteLocation> {
    conn.query_row(
        "SELECT id, name, latitude, longitude, description, created_at
         FROM locations WHERE id = ?1",
        params![id],
        location_from_row,
    )
    .optional()?
    .ok_or_else(|| CatalogError::LocationNotFound(id.to_string()))
}

fn find_image(conn: &Connection, filename: &str) -> CatalogResult<ImageRecord> {
    conn.query_row(
        &format!("SELECT {IMAGE_COLUMNS} FROM images WHERE filename = ?1"),
        params![filename],
        image_from_row,
    )
    .optional()?
    .ok_or_else(|| CatalogError::ImageNotFound(filename.to_string()))
}

impl CatalogStore for SqliteCatalog {
    fn list_images(&self, filter: &ImageFilter) -> CatalogResult<Vec<ImageRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {IMAGE_COLUMNS} FROM images
             WHERE (?1 = 0 OR (latitude IS NOT NULL AND longitude IS NOT NULL))
             ORDER BY rowid"
        ))?;
        let records = stmt
            .query_map(params![filter.with_gps_only], image_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        // substring search stays in Rust so both backends fold case identically
        Ok(records.into_iter().filter(|r| filter.matches(r)).collect())
    }

    fn get_image(&self, filename: &str) -> CatalogResult<ImageRecord> {
        find_image(&self.conn(), filename)
    }

    fn upsert_image(&self, record: &ImageRecord) -> CatalogResult<()> {
        let now = Utc::now().to_rfc3339();
        upsert(&self.conn(), record, &now)?;
        Ok(())
    }

    fn replace_images(&self, records: &[ImageRecord]) -> CatalogResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        tx.execute("DELETE FROM images", [])?;
        for record in records {
            upsert(&tx, record, &now)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn tag_gps(
        &self,
        filename: &str,
        latitude: f64,
        longitude: f64,
    ) -> CatalogResult<ImageRecord> {
        let coordinates = manual_coordinates(latitude, longitude)?;
        let conn = self.conn();
        if find_image(&conn, filename)?.error.is_some() {
            return Err(CatalogError::UnreadableImage(filename.to_string()));
        }
        conn.execute(
            "UPDATE images SET latitude = ?1, longitude = ?2, manually_tagged = 1, updated_at = ?3
             WHERE filename = ?4",
            params![
                coordinates.latitude,
                coordinates.longitude,
                Utc::now().to_rfc3339(),
                filename
            ],
        )?;
        find_image(&conn, filename)
    }

    fn delete_image(&self, filename: &str) -> CatalogResult<ImageRecord> {
        let conn = self.conn();
        let record = find_image(&conn, filename)?;
        conn.execute("DELETE FROM images WHERE filename = ?1", params![filename])?;
        Ok(record)
    }

    fn stats(&self) -> CatalogResult<CatalogStats> {
        let conn = self.conn();
        let (total, with_gps, with_errors): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE latitude IS NOT NULL AND longitude IS NOT NULL),
                    COUNT(*) FILTER (WHERE error IS NOT NULL)
             FROM images",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        let total_images = total as usize;
        let images_with_gps = with_gps as usize;
        Ok(CatalogStats {
            total_images,
            images_with_gps,
            images_without_gps: total_images - images_with_gps,
            images_with_errors: with_errors as usize,
        })
    }

    fn list_locations(&self) -> CatalogResult<Vec<FavoriteLocation>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, latitude, longitude, description, created_at
             FROM locations ORDER BY rowid",
        )?;
        let locations = stmt
            .query_map([], location_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(locations)
    }

    fn create_location(&self, input: LocationInput) -> CatalogResult<FavoriteLocation> {
        check_location(input.latitude, input.longitude)?;
        let location = FavoriteLocation {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            latitude: input.latitude,
            longitude: input.longitude,
            description: input.description,
            created_at: Utc::now(),
        };
        let created_at = location.created_at.to_rfc3339();
        self.conn().execute(
            "INSERT INTO locations (id, name, latitude, longitude, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                location.id,
                location.name,
                location.latitude,
                location.longitude,
                location.description,
                created_at,
            ],
        )?;
        Ok(location)
    }

    fn update_location(&self, id: &str, patch: &LocationPatch) -> CatalogResult<FavoriteLocation> {
        let conn = self.conn();
        let mut location = find_location(&conn, id)?;
        patch.apply(&mut location);
        check_location(location.latitude, location.longitude)?;
        conn.execute(
            "UPDATE locations SET name = ?1, latitude = ?2, longitude = ?3, description = ?4,
                 updated_at = ?5
             WHERE id = ?6",
            params![
                location.name,
                location.latitude,
                location.longitude,
                location.description,
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        Ok(location)
    }

    fn delete_location(&self, id: &str) -> CatalogResult<()> {
        let deleted = self
            .conn()
            .execute("DELETE FROM locations WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(CatalogError::LocationNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::gps::Coordinates;

    fn record(name: &str) -> ImageRecord {
        let mut r = ImageRecord::new(name, format!("/fishes/{name}"));
        r.width = Some(1024);
        r.height = Some(768);
        r.make = Some("SONY".into());
        r.datetimeoriginal = Some("2023:07:14 10:22:05".into());
        r
    }

    #[test]
    fn test_captured_at_parsing() {
        let r = record("a.jpg");
        assert_eq!(captured_at(&r).as_deref(), Some("2023-07-14T10:22:05"));

        let mut r = ImageRecord::new("b.jpg", "/b.jpg");
        r.datetime = Some("not a date".into());
        assert_eq!(captured_at(&r), None);
    }

    #[test]
    fn test_roundtrip_is_lossless() {
        let store = SqliteCatalog::open_in_memory().unwrap();
        let mut original = record("batfish.jpg");
        original.set_coordinates(Coordinates {
            latitude: 16.054_400_000_000_1,
            longitude: -108.202_2,
        });
        store.upsert_image(&original).unwrap();

        let loaded = store.get_image("batfish.jpg").unwrap();
        assert_eq!(loaded, original);
        assert_eq!(
            loaded.latitude.unwrap().to_bits(),
            original.latitude.unwrap().to_bits()
        );
        assert!(loaded.model.is_none());
        assert!(loaded.error.is_none());
    }

    #[test]
    fn test_error_record_roundtrip() {
        let store = SqliteCatalog::open_in_memory().unwrap();
        let failed = ImageRecord::failed("broken.jpg", "/fishes/broken.jpg", "truncated");
        store.upsert_image(&failed).unwrap();
        assert_eq!(store.get_image("broken.jpg").unwrap(), failed);
        assert_eq!(store.stats().unwrap().images_with_errors, 1);
        assert!(matches!(
            store.tag_gps("broken.jpg", 10.0, 20.0),
            Err(CatalogError::UnreadableImage(_))
        ));
        assert!(!store.get_image("broken.jpg").unwrap().has_gps());
    }

    #[test]
    fn test_upsert_keeps_single_row() {
        let store = SqliteCatalog::open_in_memory().unwrap();
        store.upsert_image(&record("a.jpg")).unwrap();
        store.upsert_image(&record("b.jpg")).unwrap();
        let mut updated = record("a.jpg");
        updated.model = Some("RX100".into());
        store.upsert_image(&updated).unwrap();

        let all = store.list_images(&ImageFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].filename, "a.jpg");
        assert_eq!(all[0].model.as_deref(), Some("RX100"));
    }

    #[test]
    fn test_filters_and_stats() {
        let store = SqliteCatalog::open_in_memory().unwrap();
        let mut tagged = record("Green_Turtle.jpg");
        tagged.set_coordinates(Coordinates {
            latitude: 16.1,
            longitude: 108.3,
        });
        store
            .replace_images(&[tagged, record("moray.jpg"), record("turtle_2.jpg")])
            .unwrap();

        let gps_only = ImageFilter {
            search: None,
            with_gps_only: true,
        };
        assert_eq!(store.list_images(&gps_only).unwrap().len(), 1);

        let search = ImageFilter {
            search: Some("turtle".into()),
            with_gps_only: false,
        };
        assert_eq!(store.list_images(&search).unwrap().len(), 2);

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_images, 3);
        assert_eq!(stats.images_with_gps, 1);
        assert_eq!(stats.images_without_gps, 2);
    }

    #[test]
    fn test_tag_gps_and_delete() {
        let store = SqliteCatalog::open_in_memory().unwrap();
        store.upsert_image(&record("ray.jpg")).unwrap();

        let tagged = store.tag_gps("ray.jpg", 10.5, -20.25).unwrap();
        assert!(tagged.manually_tagged);
        assert_eq!(tagged.longitude, Some(-20.25));
        assert!(matches!(
            store.tag_gps("ray.jpg", 0.0, 0.0),
            Err(CatalogError::InvalidCoordinates { .. })
        ));
        assert!(matches!(
            store.tag_gps("ghost.jpg", 1.0, 1.0),
            Err(CatalogError::ImageNotFound(_))
        ));

        assert!(store.delete_image("ray.jpg").unwrap().manually_tagged);
        assert!(matches!(
            store.get_image("ray.jpg"),
            Err(CatalogError::ImageNotFound(_))
        ));
    }

    #[test]
    fn test_location_lifecycle() {
        let store = SqliteCatalog::open_in_memory().unwrap();
        let created = store
            .create_location(LocationInput {
                name: "Nam O reef".into(),
                latitude: 16.11,
                longitude: 108.13,
                description: Some("Night dives".into()),
            })
            .unwrap();

        let listed = store.list_locations().unwrap();
        assert_eq!(listed, vec![created.clone()]);

        let patch = LocationPatch {
            longitude: Some(108.14),
            ..Default::default()
        };
        let updated = store.update_location(&created.id, &patch).unwrap();
        assert_eq!(updated.longitude, 108.14);
        assert_eq!(updated.description.as_deref(), Some("Night dives"));

        assert!(matches!(
            store.update_location("missing", &patch),
            Err(CatalogError::LocationNotFound(_))
        ));

        store.delete_location(&created.id).unwrap();
        assert!(store.list_locations().unwrap().is_empty());
    }
}
