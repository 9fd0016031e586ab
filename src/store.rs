//! State Store: rusqlite-backed persistence for queries, crawl sessions,
//! and merged listings. Mirrors the teacher's `Mutex<Connection>` + idempotent
//! migration style (`db.rs`), generalized to this domain's schema.

use crate::error::CrawlError;
use crate::models::{
    Canonical, CrawlOptions, CrawlSummary, Listing, MergedListing, MetroDistance, Query,
    QueryListItem, RegionBreakdown, SimilarQuery, StatisticsResponse,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Mutex;

const MAX_HASHED_IMAGES: usize = 10;

pub struct Store {
    conn: Mutex<Connection>,
}

#[derive(Debug, Default, Clone)]
pub struct QueryFilter {
    pub region: Option<String>,
    pub since_date: Option<String>,
    pub has_rentals: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

impl Store {
    pub fn new(path: &str) -> Result<Self, CrawlError> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let store = Store { conn: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), CrawlError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS queries (
                id TEXT PRIMARY KEY,
                description TEXT NOT NULL,
                region TEXT NOT NULL,
                kind TEXT,
                stations TEXT NOT NULL DEFAULT '',
                metro_line TEXT,
                price_min INTEGER,
                price_max INTEGER,
                sections TEXT NOT NULL DEFAULT '',
                rooms TEXT NOT NULL DEFAULT '',
                floor TEXT,
                first_seen_at TEXT NOT NULL,
                last_seen_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_queries_region ON queries(region);
            CREATE INDEX IF NOT EXISTS idx_queries_price ON queries(price_min, price_max);

            CREATE TABLE IF NOT EXISTS query_stations (
                query_id TEXT NOT NULL REFERENCES queries(id),
                station_id TEXT NOT NULL,
                PRIMARY KEY (query_id, station_id)
            );
            CREATE INDEX IF NOT EXISTS idx_query_stations_station ON query_stations(station_id);

            CREATE TABLE IF NOT EXISTS crawl_sessions (
                id TEXT PRIMARY KEY,
                query_id TEXT NOT NULL REFERENCES queries(id),
                started_at TEXT NOT NULL,
                finished_at TEXT,
                station_count INTEGER NOT NULL,
                multi_station INTEGER NOT NULL,
                total_listings INTEGER NOT NULL DEFAULT 0,
                new_listings INTEGER NOT NULL DEFAULT 0,
                notifications_sent INTEGER NOT NULL DEFAULT 0,
                error_count INTEGER NOT NULL DEFAULT 0,
                options TEXT NOT NULL DEFAULT '{}'
            );
            CREATE INDEX IF NOT EXISTS idx_sessions_query ON crawl_sessions(query_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_started ON crawl_sessions(started_at);

            CREATE TABLE IF NOT EXISTS rentals (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                link TEXT NOT NULL,
                house_type TEXT NOT NULL,
                rooms TEXT NOT NULL,
                tags_list TEXT NOT NULL DEFAULT '[]',
                image_urls TEXT NOT NULL DEFAULT '[]',
                price_text TEXT NOT NULL DEFAULT '',
                first_seen_at TEXT NOT NULL,
                last_seen_at TEXT NOT NULL,
                content_hash TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_rentals_last_seen ON rentals(last_seen_at);

            CREATE TABLE IF NOT EXISTS metro_distances (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rental_id TEXT NOT NULL REFERENCES rentals(id) ON DELETE CASCADE,
                station_id TEXT,
                station_name TEXT,
                metro_value_text TEXT NOT NULL,
                distance_meters INTEGER
            );
            CREATE INDEX IF NOT EXISTS idx_metro_rental ON metro_distances(rental_id);

            CREATE TABLE IF NOT EXISTS query_rentals (
                query_id TEXT NOT NULL REFERENCES queries(id),
                rental_id TEXT NOT NULL REFERENCES rentals(id) ON DELETE CASCADE,
                PRIMARY KEY (query_id, rental_id)
            );
            CREATE INDEX IF NOT EXISTS idx_query_rentals_rental ON query_rentals(rental_id);

            CREATE TABLE IF NOT EXISTS crawl_session_rentals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL REFERENCES crawl_sessions(id),
                rental_id TEXT NOT NULL REFERENCES rentals(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_session_rentals_session ON crawl_session_rentals(session_id);

            CREATE TABLE IF NOT EXISTS notification_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                rental_id TEXT NOT NULL,
                silent INTEGER NOT NULL,
                delivered INTEGER NOT NULL,
                sent_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    pub fn upsert_query(&self, canonical: &Canonical, now: &str) -> Result<Query, CrawlError> {
        let conn = self.conn.lock().unwrap();
        let p = &canonical.params;
        conn.execute(
            "INSERT INTO queries (id, description, region, kind, stations, metro_line, price_min, price_max, sections, rooms, floor, first_seen_at, last_seen_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
             ON CONFLICT(id) DO UPDATE SET last_seen_at = excluded.last_seen_at, description = excluded.description",
            params![
                canonical.query_id,
                canonical.description,
                p.region,
                p.kind,
                p.stations.join(","),
                p.metro_line,
                p.price_min,
                p.price_max,
                p.sections.join(","),
                p.rooms.join(","),
                p.floor,
                now,
            ],
        )?;

        conn.execute("DELETE FROM query_stations WHERE query_id = ?1", params![canonical.query_id])?;
        for station_id in &p.stations {
            conn.execute(
                "INSERT OR IGNORE INTO query_stations (query_id, station_id) VALUES (?1, ?2)",
                params![canonical.query_id, station_id],
            )?;
        }

        row_to_query(&conn, &canonical.query_id)
    }

    pub fn get_existing_property_ids(&self, query_id: &str) -> Result<HashSet<String>, CrawlError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT rental_id FROM query_rentals WHERE query_id = ?1")?;
        let ids = stmt
            .query_map(params![query_id], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    pub fn open_session(
        &self,
        query_id: &str,
        options: &CrawlOptions,
        station_count: usize,
        multi_station: bool,
        now: &str,
    ) -> Result<String, CrawlError> {
        let id = uuid::Uuid::new_v4().to_string();
        let options_json = serde_json::to_string(options).unwrap_or_else(|_| "{}".to_string());
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO crawl_sessions (id, query_id, started_at, station_count, multi_station, options)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, query_id, now, station_count as i64, multi_station as i64, options_json],
        )?;
        Ok(id)
    }

    pub fn close_session(&self, session_id: &str, summary: &CrawlSummary, now: &str) -> Result<(), CrawlError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE crawl_sessions SET finished_at = ?1, total_listings = ?2, new_listings = ?3, notifications_sent = ?4, error_count = ?5 WHERE id = ?6",
            params![
                now,
                summary.total_rentals as i64,
                summary.new_rentals as i64,
                summary.notifications_sent as i64,
                summary.crawl_errors.len() as i64,
                session_id,
            ],
        )?;
        Ok(())
    }

    /// Persists observed listings, skipping scalar updates (only `last_seen_at`
    /// bumps) when `content_hash` is unchanged. Links each listing to the
    /// query and records a session-listing row. Runs in a single transaction;
    /// on failure the session is left open (`spec.md` §4.7 failure model).
    pub fn persist_listings(
        &self,
        session_id: &str,
        query_id: &str,
        listings: &[MergedListing],
        notified_ids: &HashSet<String>,
        silent_ids: &HashSet<String>,
        now: &str,
    ) -> Result<Vec<Listing>, CrawlError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let mut persisted = Vec::with_capacity(listings.len());

        for listing in listings {
            let hash = content_hash(listing);
            let existing_hash: Option<String> = tx
                .query_row("SELECT content_hash FROM rentals WHERE id = ?1", params![listing.id], |r| r.get(0))
                .optional()?;

            match existing_hash {
                Some(ref h) if h == &hash => {
                    tx.execute("UPDATE rentals SET last_seen_at = ?1 WHERE id = ?2", params![now, listing.id])?;
                }
                Some(_) => {
                    upsert_rental_row(&tx, listing, &hash, now, false)?;
                    replace_metro_distances(&tx, listing)?;
                }
                None => {
                    upsert_rental_row(&tx, listing, &hash, now, true)?;
                    replace_metro_distances(&tx, listing)?;
                }
            }

            tx.execute(
                "INSERT OR IGNORE INTO query_rentals (query_id, rental_id) VALUES (?1, ?2)",
                params![query_id, listing.id],
            )?;
            tx.execute(
                "INSERT INTO crawl_session_rentals (session_id, rental_id) VALUES (?1, ?2)",
                params![session_id, listing.id],
            )?;

            if notified_ids.contains(&listing.id) {
                tx.execute(
                    "INSERT INTO notification_log (session_id, rental_id, silent, delivered, sent_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![session_id, listing.id, silent_ids.contains(&listing.id) as i64, true as i64, now],
                )?;
            }

            persisted.push(row_to_listing(&tx, &listing.id)?);
        }

        tx.commit()?;
        Ok(persisted)
    }

    /// Transactional cascade: session-listing links, sessions, query-listing
    /// links, then metro distances and the rentals themselves for any
    /// listing no longer referenced by any query.
    pub fn clear_query(&self, query_id: &str) -> Result<(i64, i64, i64), CrawlError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let rental_ids: Vec<String> = {
            let mut stmt = tx.prepare("SELECT rental_id FROM query_rentals WHERE query_id = ?1")?;
            stmt.query_map(params![query_id], |r| r.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?
        };

        let sessions_removed = tx.execute(
            "DELETE FROM crawl_session_rentals WHERE session_id IN (SELECT id FROM crawl_sessions WHERE query_id = ?1)",
            params![query_id],
        )? as i64;
        tx.execute("DELETE FROM crawl_sessions WHERE query_id = ?1", params![query_id])?;

        let query_rentals_removed = tx.execute("DELETE FROM query_rentals WHERE query_id = ?1", params![query_id])? as i64;

        let mut rentals_removed = 0i64;
        for rental_id in &rental_ids {
            let still_referenced: i64 = tx.query_row(
                "SELECT COUNT(*) FROM query_rentals WHERE rental_id = ?1",
                params![rental_id],
                |r| r.get(0),
            )?;
            if still_referenced == 0 {
                tx.execute("DELETE FROM metro_distances WHERE rental_id = ?1", params![rental_id])?;
                tx.execute("DELETE FROM rentals WHERE id = ?1", params![rental_id])?;
                rentals_removed += 1;
            }
        }

        tx.commit()?;
        Ok((query_rentals_removed, sessions_removed, rentals_removed))
    }

    pub fn list_rentals(&self, query_id: &str, limit: Option<i64>, since_date: Option<&str>) -> Result<Vec<Listing>, CrawlError> {
        let conn = self.conn.lock().unwrap();
        let ids: Vec<String> = {
            let sql = match since_date {
                Some(_) => "SELECT r.id FROM rentals r JOIN query_rentals qr ON qr.rental_id = r.id WHERE qr.query_id = ?1 AND r.last_seen_at >= ?2 ORDER BY r.last_seen_at DESC",
                None => "SELECT r.id FROM rentals r JOIN query_rentals qr ON qr.rental_id = r.id WHERE qr.query_id = ?1 ORDER BY r.last_seen_at DESC",
            };
            let mut stmt = conn.prepare(sql)?;
            match since_date {
                Some(since) => stmt.query_map(params![query_id, since], |r| r.get::<_, String>(0))?.collect::<Result<Vec<_>, _>>()?,
                None => stmt.query_map(params![query_id], |r| r.get::<_, String>(0))?.collect::<Result<Vec<_>, _>>()?,
            }
        };

        let ids = match limit {
            Some(n) => ids.into_iter().take(n.max(0) as usize).collect::<Vec<_>>(),
            None => ids,
        };

        ids.iter().map(|id| row_to_listing(&conn, id)).collect()
    }

    pub fn get_query(&self, query_id: &str) -> Result<Query, CrawlError> {
        let conn = self.conn.lock().unwrap();
        row_to_query(&conn, query_id)
    }

    pub fn list_queries(&self, filter: &QueryFilter) -> Result<(Vec<QueryListItem>, i64), CrawlError> {
        let conn = self.conn.lock().unwrap();

        let mut where_clauses = Vec::new();
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(region) = &filter.region {
            where_clauses.push("region = ?".to_string());
            args.push(Box::new(region.clone()));
        }
        if let Some(since) = &filter.since_date {
            where_clauses.push("last_seen_at >= ?".to_string());
            args.push(Box::new(since.clone()));
        }
        let where_sql = if where_clauses.is_empty() { String::new() } else { format!("WHERE {}", where_clauses.join(" AND ")) };

        let count_sql = format!("SELECT COUNT(*) FROM queries {where_sql}");
        let total: i64 = conn.query_row(&count_sql, rusqlite::params_from_iter(args.iter().map(|b| b.as_ref())), |r| r.get(0))?;

        let list_sql = format!(
            "SELECT id FROM queries {where_sql} ORDER BY last_seen_at DESC LIMIT ?{} OFFSET ?{}",
            args.len() + 1,
            args.len() + 2,
        );
        let mut all_args = args;
        all_args.push(Box::new(filter.limit));
        all_args.push(Box::new(filter.offset));

        let mut stmt = conn.prepare(&list_sql)?;
        let ids: Vec<String> = stmt
            .query_map(rusqlite::params_from_iter(all_args.iter().map(|b| b.as_ref())), |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            let query = row_to_query(&conn, &id)?;
            let rental_count: i64 = conn.query_row("SELECT COUNT(*) FROM query_rentals WHERE query_id = ?1", params![id], |r| r.get(0))?;
            if let Some(must_have) = filter.has_rentals {
                if must_have != (rental_count > 0) {
                    continue;
                }
            }
            items.push(QueryListItem { query, rental_count });
        }

        Ok((items, total))
    }

    /// Scores every other query sharing `region` and at least one station
    /// or an overlapping price range, 0-100.
    pub fn similar_queries(&self, query_id: &str, limit: i64) -> Result<Vec<SimilarQuery>, CrawlError> {
        let conn = self.conn.lock().unwrap();
        let base = row_to_query(&conn, query_id)?;
        let base_stations: HashSet<&str> = base.stations.iter().map(String::as_str).collect();

        let mut stmt = conn.prepare("SELECT id FROM queries WHERE region = ?1 AND id != ?2")?;
        let candidate_ids: Vec<String> = stmt
            .query_map(params![base.region, query_id], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut scored = Vec::new();
        for id in candidate_ids {
            let candidate = row_to_query(&conn, &id)?;
            let candidate_stations: HashSet<&str> = candidate.stations.iter().map(String::as_str).collect();
            let shared_stations = base_stations.intersection(&candidate_stations).count();
            let price_overlap = ranges_overlap(base.price_min, base.price_max, candidate.price_min, candidate.price_max);

            if shared_stations == 0 && !price_overlap {
                continue;
            }

            let mut score = 40i64;
            score += (shared_stations as i64 * 20).min(40);
            if price_overlap {
                score += 20;
            }
            let score = score.min(100);

            scored.push(SimilarQuery { query: candidate, score });
        }

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(limit.max(0) as usize);
        Ok(scored)
    }

    pub fn statistics(&self) -> Result<StatisticsResponse, CrawlError> {
        let conn = self.conn.lock().unwrap();
        let total_queries: i64 = conn.query_row("SELECT COUNT(*) FROM queries", [], |r| r.get(0))?;
        let total_sessions: i64 = conn.query_row("SELECT COUNT(*) FROM crawl_sessions", [], |r| r.get(0))?;
        let total_rentals: i64 = conn.query_row("SELECT COUNT(*) FROM rentals", [], |r| r.get(0))?;

        let mut stmt = conn.prepare(
            "SELECT q.region, COUNT(DISTINCT q.id), COUNT(DISTINCT qr.rental_id)
             FROM queries q LEFT JOIN query_rentals qr ON qr.query_id = q.id
             GROUP BY q.region ORDER BY q.region",
        )?;
        let regions = stmt
            .query_map([], |r| {
                Ok(RegionBreakdown {
                    region: r.get(0)?,
                    query_count: r.get(1)?,
                    rental_count: r.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StatisticsResponse { total_queries, total_sessions, total_rentals, regions })
    }
}

fn ranges_overlap(a_min: Option<i64>, a_max: Option<i64>, b_min: Option<i64>, b_max: Option<i64>) -> bool {
    if a_min.is_none() && a_max.is_none() && b_min.is_none() && b_max.is_none() {
        return false;
    }
    let a_min = a_min.unwrap_or(i64::MIN);
    let a_max = a_max.unwrap_or(i64::MAX);
    let b_min = b_min.unwrap_or(i64::MIN);
    let b_max = b_max.unwrap_or(i64::MAX);
    a_min <= b_max && b_min <= a_max
}

fn upsert_rental_row(tx: &Transaction, listing: &MergedListing, hash: &str, now: &str, is_new: bool) -> Result<(), CrawlError> {
    let tags_json = serde_json::to_string(&listing.tags_list).unwrap_or_else(|_| "[]".to_string());
    let images_json = serde_json::to_string(&listing.image_urls).unwrap_or_else(|_| "[]".to_string());

    if is_new {
        tx.execute(
            "INSERT INTO rentals (id, title, link, house_type, rooms, tags_list, image_urls, price_text, first_seen_at, last_seen_at, content_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?10)",
            params![listing.id, listing.title, listing.link, listing.house_type, listing.rooms, tags_json, images_json, listing.price_text, now, hash],
        )?;
    } else {
        tx.execute(
            "UPDATE rentals SET title = ?2, link = ?3, house_type = ?4, rooms = ?5, tags_list = ?6, image_urls = ?7, price_text = ?8, last_seen_at = ?9, content_hash = ?10 WHERE id = ?1",
            params![listing.id, listing.title, listing.link, listing.house_type, listing.rooms, tags_json, images_json, listing.price_text, now, hash],
        )?;
    }
    Ok(())
}

fn replace_metro_distances(tx: &Transaction, listing: &MergedListing) -> Result<(), CrawlError> {
    tx.execute("DELETE FROM metro_distances WHERE rental_id = ?1", params![listing.id])?;
    for facet in &listing.metro_distances {
        tx.execute(
            "INSERT INTO metro_distances (rental_id, station_id, station_name, metro_value_text, distance_meters) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![listing.id, facet.station_id, facet.station_name, facet.metro_value_text, facet.distance_meters],
        )?;
    }
    Ok(())
}

fn row_to_query(conn: &Connection, id: &str) -> Result<Query, CrawlError> {
    conn.query_row(
        "SELECT id, description, region, kind, stations, metro_line, price_min, price_max, sections, rooms, floor, first_seen_at, last_seen_at FROM queries WHERE id = ?1",
        params![id],
        |row| {
            Ok(Query {
                id: row.get(0)?,
                description: row.get(1)?,
                region: row.get(2)?,
                kind: row.get(3)?,
                stations: split_csv(row.get::<_, String>(4)?),
                metro_line: row.get(5)?,
                price_min: row.get(6)?,
                price_max: row.get(7)?,
                sections: split_csv(row.get::<_, String>(8)?),
                rooms: split_csv(row.get::<_, String>(9)?),
                floor: row.get(10)?,
                first_seen_at: row.get(11)?,
                last_seen_at: row.get(12)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| CrawlError::QueryNotFound(id.to_string()))
}

fn row_to_listing(conn: &Connection, id: &str) -> Result<Listing, CrawlError> {
    let (title, link, house_type, rooms, tags_json, images_json, price_text, first_seen_at, last_seen_at, content_hash): (
        String, String, String, String, String, String, String, String, String, String,
    ) = conn.query_row(
        "SELECT title, link, house_type, rooms, tags_list, image_urls, price_text, first_seen_at, last_seen_at, content_hash FROM rentals WHERE id = ?1",
        params![id],
        |row| {
            Ok((
                row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?,
                row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?,
            ))
        },
    )?;

    let mut stmt = conn.prepare("SELECT station_id, station_name, metro_value_text, distance_meters FROM metro_distances WHERE rental_id = ?1 ORDER BY id")?;
    let metro_distances = stmt
        .query_map(params![id], |row| {
            Ok(MetroDistance {
                station_id: row.get(0)?,
                station_name: row.get(1)?,
                metro_value_text: row.get(2)?,
                distance_meters: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Listing {
        id: id.to_string(),
        title,
        link,
        house_type,
        rooms,
        tags_list: serde_json::from_str(&tags_json).unwrap_or_default(),
        image_urls: serde_json::from_str(&images_json).unwrap_or_default(),
        price_text,
        metro_distances,
        first_seen_at,
        last_seen_at,
        content_hash,
    })
}

fn split_csv(s: String) -> Vec<String> {
    if s.is_empty() {
        Vec::new()
    } else {
        s.split(',').map(str::to_string).collect()
    }
}

/// Content hash excludes image-URL ordering past a sorted 10-prefix and any
/// notification metadata, so cosmetic reshuffles on the site don't trigger a
/// dirty write (`spec.md` §9).
fn content_hash(listing: &MergedListing) -> String {
    let mut hasher = Sha256::new();
    hasher.update(listing.title.as_bytes());
    hasher.update(listing.house_type.as_bytes());
    hasher.update(listing.rooms.as_bytes());

    let mut tags = listing.tags_list.clone();
    tags.sort();
    hasher.update(tags.join(",").as_bytes());

    let mut images: Vec<&str> = listing.image_urls.iter().map(String::as_str).take(MAX_HASHED_IMAGES).collect();
    images.sort();
    hasher.update(images.join(",").as_bytes());

    let mut facets: Vec<String> = listing
        .metro_distances
        .iter()
        .map(|f| format!("{}|{}|{}", f.station_id.as_deref().unwrap_or(""), f.station_name.as_deref().unwrap_or(""), f.metro_value_text))
        .collect();
    facets.sort();
    hasher.update(facets.join(";").as_bytes());

    hex::encode(hasher.finalize())
}
