//! Scenario loading from comma-delimited files
//!
//! Line format, eight required floats then optional fields:
//!
//! ```text
//! x, y, z, vx, vy, vz, mass, radius [, is_sun [, collision [, color [, frag_factor [, frag_step]]]]]
//! ```
//!
//! `#` in column one starts a comment. A record that fails to parse is
//! skipped and the rest of the file continues: these files are operator
//! edited, and robustness beats strictness here. Only failure to open the
//! file is an error.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};
use nalgebra::{Point3, Vector3};

use orrery_body::{next_id, parse_flag, Body, BodyColor, CollisionBehavior};

use crate::error::ScenarioError;

/// Light intensity given to suns declared in a CSV
const CSV_SUN_INTENSITY: f64 = 100.0;

/// Parses a CSV file into at most `body_count` bodies
///
/// # Arguments
///
/// * `path` - File to read
/// * `body_count` - Cap on bodies loaded; records past the cap are ignored
/// * `default_collision` - Behavior for records that omit the field
/// * `default_color` - Color for records that omit the field
///
/// # Examples
///
/// ```no_run
/// use orrery_body::{BodyColor, CollisionBehavior};
/// use orrery_sim::load_csv;
///
/// let bodies = load_csv(
///     "scenario.csv".as_ref(),
///     1000,
///     CollisionBehavior::Elastic,
///     BodyColor::Random,
/// )?;
/// # Ok::<(), orrery_sim::ScenarioError>(())
/// ```
pub fn load_csv(
    path: &Path,
    body_count: usize,
    default_collision: CollisionBehavior,
    default_color: BodyColor,
) -> Result<Vec<Body>, ScenarioError> {
    let file = File::open(path).map_err(|source| ScenarioError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut bodies = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        if bodies.len() >= body_count {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("read error in {} at line {}: {e}", path.display(), line_no + 1);
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_record(trimmed, default_collision, default_color) {
            Some(body) => bodies.push(body),
            None => debug!(
                "skipping unparseable record at {}:{}",
                path.display(),
                line_no + 1
            ),
        }
    }
    Ok(bodies)
}

/// Parses one record, or `None` if any required field fails
fn parse_record(
    line: &str,
    default_collision: CollisionBehavior,
    default_color: BodyColor,
) -> Option<Body> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 8 {
        return None;
    }
    let mut floats = [0.0f64; 8];
    for (slot, field) in floats.iter_mut().zip(&fields[..8]) {
        *slot = field.parse().ok()?;
    }
    let [x, y, z, vx, vy, vz, mass, radius] = floats;

    let is_sun = fields.get(8).is_some_and(|f| parse_flag(f));
    let collision = fields
        .get(9)
        .filter(|f| !f.is_empty())
        .map_or(default_collision, |f| CollisionBehavior::parse(f));
    let color = fields
        .get(10)
        .filter(|f| !f.is_empty())
        .map_or(default_color, |f| BodyColor::parse(f));
    let frag_factor = fields.get(11).and_then(|f| f.parse().ok()).unwrap_or(0.0);
    let frag_step = fields.get(12).and_then(|f| f.parse().ok()).unwrap_or(0.0);

    let mut body = Body::new(
        next_id(),
        Point3::new(x, y, z),
        Vector3::new(vx, vy, vz),
        mass,
        radius,
    );
    body.behavior = collision;
    body.color = color;
    body.frag_factor = frag_factor;
    body.frag_step = frag_step;
    if is_sun {
        body.set_sun(CSV_SUN_INTENSITY);
    }
    Some(body)
}
