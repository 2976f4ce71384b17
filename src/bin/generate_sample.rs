use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const OUTPUT_DIR: &str = "data";
const CSV_NAME: &str = "3I_ATLAS_satellites_with_NORAD.csv";
const PARQUET_NAME: &str = "3I_ATLAS_satellites_with_NORAD.parquet";

const OPERATORS: &[&str] = &["NASA", "ESA", "JAXA", "CNSA", "ISRO", "NOAA"];
const MISSION_TYPES: &[&str] = &["Orbiter", "Flyby", "Space Telescope", "Solar Observatory", "Lander"];
const LOCATIONS: &[&str] = &["Earth orbit", "Sun-Earth L1", "Sun-Earth L2", "Mars orbit", "Heliocentric"];
const UTILITIES: &[&str] = &["High", "Medium", "Low"];
const NOTES: &[&str] = &[
    "Wide-field imager available",
    "Spectrometer, limited pointing",
    "Coronagraph may see tail",
    "",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

/// One generated spacecraft. `None` fields are written as empty cells.
struct Observer {
    name: String,
    norad_id: Option<i64>,
    cospar_id: String,
    operator: String,
    mission_type: Option<String>,
    location: String,
    tle_available: bool,
    utility: String,
    launch_date: String,
    notes: String,
}

fn generate(rng: &mut SimpleRng, count: usize) -> Vec<Observer> {
    (0..count)
        .map(|i| {
            let year = 1995 + rng.below(30) as i64;
            let month = 1 + rng.below(12);
            let day = 1 + rng.below(28);
            let location = rng.pick(LOCATIONS).to_string();
            // Only objects around Earth have two-line elements.
            let tle_available = location == "Earth orbit";
            Observer {
                name: format!("Observer-{:02}", i + 1),
                norad_id: tle_available.then(|| 20000 + rng.below(40000) as i64),
                cospar_id: format!("{year}-{:03}A", 1 + rng.below(150)),
                operator: rng.pick(OPERATORS).to_string(),
                // Every seventh record has no mission type, to exercise `Unknown`.
                mission_type: (i % 7 != 6).then(|| rng.pick(MISSION_TYPES).to_string()),
                location,
                tle_available,
                utility: rng.pick(UTILITIES).to_string(),
                launch_date: if i % 11 == 10 {
                    "TBD".to_string()
                } else {
                    format!("{year}-{month:02}-{day:02}")
                },
                notes: rng.pick(NOTES).to_string(),
            }
        })
        .collect()
}

const HEADER: [&str; 10] = [
    "Name",
    "NORAD_CAT_ID",
    "COSPAR_ID",
    "Operator",
    "Mission_Type",
    "Current_Location",
    "Earth_TLE_Available",
    "3I_ATLAS_View_Utility",
    "Launch_Date_UTC",
    "Notes",
];

fn write_csv(path: &Path, observers: &[Observer]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record(HEADER)?;
    for o in observers {
        writer.write_record([
            o.name.clone(),
            o.norad_id.map(|id| id.to_string()).unwrap_or_default(),
            o.cospar_id.clone(),
            o.operator.clone(),
            o.mission_type.clone().unwrap_or_default(),
            o.location.clone(),
            if o.tle_available { "True" } else { "False" }.to_string(),
            o.utility.clone(),
            o.launch_date.clone(),
            o.notes.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, observers: &[Observer]) -> Result<()> {
    let text = |f: fn(&Observer) -> Option<&str>| -> ArrayRef {
        Arc::new(StringArray::from(observers.iter().map(f).collect::<Vec<_>>()))
    };

    let columns: Vec<ArrayRef> = vec![
        text(|o| Some(o.name.as_str())),
        Arc::new(Int64Array::from(observers.iter().map(|o| o.norad_id).collect::<Vec<_>>())),
        text(|o| Some(o.cospar_id.as_str())),
        text(|o| Some(o.operator.as_str())),
        text(|o| o.mission_type.as_deref()),
        text(|o| Some(o.location.as_str())),
        Arc::new(BooleanArray::from(observers.iter().map(|o| o.tle_available).collect::<Vec<_>>())),
        text(|o| Some(o.utility.as_str())),
        text(|o| Some(o.launch_date.as_str())),
        text(|o| (!o.notes.is_empty()).then_some(o.notes.as_str())),
    ];

    let schema = Arc::new(Schema::new(
        HEADER
            .iter()
            .zip(&columns)
            .map(|(name, col)| Field::new(*name, col.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating Parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let observers = generate(&mut rng, 48);

    let dir = Path::new(OUTPUT_DIR);
    std::fs::create_dir_all(dir).context("creating output directory")?;

    let csv_path = dir.join(CSV_NAME);
    write_csv(&csv_path, &observers)?;
    let parquet_path = dir.join(PARQUET_NAME);
    write_parquet(&parquet_path, &observers)?;

    println!(
        "Wrote {} observers to {} and {}",
        observers.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
