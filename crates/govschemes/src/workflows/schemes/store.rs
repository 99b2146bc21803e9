use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::catalog::{CatalogImporter, CatalogLoad, SchemeRow, CATALOG_HEADERS};
use super::domain::{Answer, Gender, Profile, SchemeRecord, StateName, UserId};
use super::repository::{CatalogStore, ProfileStore, StoreError};

const PROFILE_HEADERS: [&str; 6] = ["username", "email", "gender", "state", "student", "married"];

/// Profiles kept in a CSV file, one row per identity.
///
/// Updates rewrite the file through a temporary sibling that is renamed over
/// the original, so readers never observe a half-written table.
#[derive(Debug)]
pub struct CsvProfileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvProfileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        ensure_table(&path, &PROFILE_HEADERS)?;
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Unavailable("profile store lock poisoned".to_string()))
    }

    fn read_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(&self.path)?;

        let mut profiles = Vec::new();
        for (index, row) in reader.deserialize::<ProfileRow>().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => {
                    warn!(row = index + 1, error = %err, "unreadable profile row skipped");
                    continue;
                }
            };
            if let Some(profile) = row.into_profile() {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }

    fn write_profiles(&self, profiles: &[Profile]) -> Result<(), StoreError> {
        let directory = parent_dir(&self.path);
        let staged = tempfile::NamedTempFile::new_in(directory)?;
        {
            let mut writer = csv::Writer::from_writer(staged.as_file());
            for profile in profiles {
                writer.serialize(ProfileRow::from(profile))?;
            }
            if profiles.is_empty() {
                writer.write_record(PROFILE_HEADERS)?;
            }
            writer.flush()?;
        }
        staged.as_file().sync_all()?;
        staged.persist(&self.path)?;
        Ok(())
    }
}

impl ProfileStore for CsvProfileStore {
    fn get(&self, identity: &UserId) -> Result<Option<Profile>, StoreError> {
        let _guard = self.guard()?;
        Ok(self
            .read_profiles()?
            .into_iter()
            .find(|profile| &profile.identity == identity))
    }

    fn upsert(&self, profile: Profile) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut profiles = self.read_profiles()?;
        match profiles
            .iter_mut()
            .find(|existing| existing.identity == profile.identity)
        {
            Some(existing) => *existing = profile,
            None => profiles.push(profile),
        }
        self.write_profiles(&profiles)?;
        debug!(path = %self.path.display(), profiles = profiles.len(), "profile table rewritten");
        Ok(())
    }

    fn all(&self) -> Result<Vec<Profile>, StoreError> {
        let _guard = self.guard()?;
        self.read_profiles()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    student: String,
    #[serde(default)]
    married: String,
}

impl ProfileRow {
    fn into_profile(self) -> Option<Profile> {
        let identity = UserId::new(self.username);
        if identity.is_blank() {
            return None;
        }

        let gender = preference::<Gender>(&identity, "gender", &self.gender);
        let student = preference::<Answer>(&identity, "student", &self.student);
        let married = preference::<Answer>(&identity, "married", &self.married);

        Some(Profile {
            state: StateName::preference(&self.state),
            email: self.email,
            gender,
            student,
            married,
            identity,
        })
    }
}

impl From<&Profile> for ProfileRow {
    fn from(profile: &Profile) -> Self {
        Self {
            username: profile.identity.0.clone(),
            email: profile.email.clone(),
            gender: profile.gender.to_string(),
            state: profile
                .state
                .as_ref()
                .map_or_else(|| "any".to_string(), ToString::to_string),
            student: profile.student.to_string(),
            married: profile.married.to_string(),
        }
    }
}

/// Unknown or blank stored preferences fall back to the wildcard.
fn preference<T>(identity: &UserId, field: &'static str, raw: &str) -> T
where
    T: std::str::FromStr + Default,
{
    if raw.trim().is_empty() {
        return T::default();
    }
    raw.parse().unwrap_or_else(|_| {
        warn!(%identity, field, value = raw, "unrecognized stored preference treated as any");
        T::default()
    })
}

/// Scheme catalog kept in a CSV file; new schemes are appended as rows.
#[derive(Debug)]
pub struct CsvCatalogStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvCatalogStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        ensure_table(&path, &CATALOG_HEADERS)?;
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Unavailable("catalog store lock poisoned".to_string()))
    }
}

impl CatalogStore for CsvCatalogStore {
    fn load_all(&self) -> Result<CatalogLoad, StoreError> {
        let _guard = self.guard()?;
        if !self.path.exists() {
            return Ok(CatalogLoad::default());
        }

        let file = File::open(&self.path)?;
        Ok(CatalogImporter::from_reader(file)?)
    }

    fn append(&self, record: SchemeRecord) -> Result<(), StoreError> {
        let _guard = self.guard()?;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        let length = file.metadata()?.len();
        if length > 0 && !ends_with_newline(&mut file)? {
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(length == 0)
            .from_writer(&file);
        writer.serialize(SchemeRow::from(&record))?;
        writer.flush()?;
        drop(writer);
        file.sync_data()?;

        debug!(path = %self.path.display(), scheme = %record.name, "scheme appended to catalog");
        Ok(())
    }
}

fn ends_with_newline(file: &mut File) -> Result<bool, std::io::Error> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Creates the table with its header row when the file does not exist yet.
fn ensure_table(path: &Path, headers: &[&str]) -> Result<(), StoreError> {
    if path.exists() {
        return Ok(());
    }

    std::fs::create_dir_all(parent_dir(path))?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(headers)?;
    writer.flush()?;
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
