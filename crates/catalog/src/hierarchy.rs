use std::{collections::BTreeMap, fmt, marker::PhantomData};

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use tracing::debug;

use crate::{error::CatalogError, selector::Level};

const BUNDLED_CATALOG: &str = include_str!("../data/catalog.json");

/// JSON object read into a list so the table order survives. Repeated keys are kept and
/// reported by validation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Ordered<V>(Vec<(String, V)>);

impl<V> Default for Ordered<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> Ordered<V> {
    fn get(&self, name: &str) -> Option<&V> {
        self.0.iter().find(|(key, _)| key == name).map(|(_, v)| v)
    }

    fn get_or_insert_with(&mut self, name: &str, make: impl FnOnce() -> V) -> &mut V {
        let idx = match self.0.iter().position(|(key, _)| key == name) {
            Some(idx) => idx,
            None => {
                self.0.push((name.to_string(), make()));
                self.0.len() - 1
            }
        };
        &mut self.0[idx].1
    }

    fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(key, _)| key.as_str()).collect()
    }

    fn values(&self) -> impl Iterator<Item = &V> {
        self.0.iter().map(|(_, v)| v)
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn first_duplicate(&self) -> Option<&str> {
        first_duplicate(self.0.iter().map(|(key, _)| key.as_str()))
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = Vec::new();
    for name in names {
        if seen.contains(&name) {
            return Some(name);
        }
        seen.push(name);
    }
    None
}

impl<V: Serialize> Serialize for Ordered<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Ordered<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object keyed by name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// Region -> institution type -> institutions, in the order the table lists them.
///
/// On the wire this is the nested object
/// `{"Delhi": {"Government Universities": ["University of Delhi"]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstitutionDirectory {
    regions: Ordered<Ordered<Vec<String>>>,
}

impl InstitutionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends institutions under `region` / `institution_type`, creating either level on
    /// first use.
    pub fn with_institutions<I, S>(
        mut self,
        region: &str,
        institution_type: &str,
        institutions: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for institution in institutions {
            self.insert(region, institution_type, institution);
        }
        self
    }

    pub fn insert(&mut self, region: &str, institution_type: &str, institution: impl Into<String>) {
        let institutions = self
            .regions
            .get_or_insert_with(region, Ordered::default)
            .get_or_insert_with(institution_type, Vec::new);
        let institution = institution.into();
        if !institutions.contains(&institution) {
            institutions.push(institution);
        }
    }

    pub fn regions(&self) -> Vec<&str> {
        self.regions.names()
    }

    pub fn institution_types(&self, region: &str) -> Vec<&str> {
        self.regions
            .get(region)
            .map(Ordered::names)
            .unwrap_or_default()
    }

    pub fn institutions(&self, region: &str, institution_type: &str) -> Vec<&str> {
        self.regions
            .get(region)
            .and_then(|types| types.get(institution_type))
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if let Some(region) = self.regions.first_duplicate() {
            return Err(CatalogError::duplicate(Level::Region, region));
        }
        for types in self.regions.values() {
            if let Some(institution_type) = types.first_duplicate() {
                return Err(CatalogError::duplicate(Level::InstitutionType, institution_type));
            }
            for institutions in types.values() {
                if let Some(institution) = first_duplicate(institutions.iter().map(String::as_str))
                {
                    return Err(CatalogError::duplicate(Level::Institution, institution));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseInfo {
    pub semester_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CourseEntry {
    semester_count: u32,
    #[serde(default)]
    subjects: BTreeMap<u32, Vec<String>>,
}

/// Course -> semester count, and course -> semester -> subjects.
///
/// On the wire: `{"B.Com": {"semester_count": 6, "subjects": {"1": ["..."]}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseCatalog {
    courses: Ordered<CourseEntry>,
}

impl CourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_course(mut self, name: &str, semester_count: u32) -> Self {
        self.insert_course(name, semester_count);
        self
    }

    /// Subjects for a course that was never registered create it with zero semesters, which
    /// [`Catalog::new`] rejects.
    pub fn with_subjects<I, S>(mut self, course: &str, semester: u32, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.courses.get_or_insert_with(course, || CourseEntry {
            semester_count: 0,
            subjects: BTreeMap::new(),
        });
        let list = entry.subjects.entry(semester).or_default();
        for subject in subjects {
            let subject = subject.into();
            if !list.contains(&subject) {
                list.push(subject);
            }
        }
        self
    }

    /// Registers a course, or updates its semester count when it already exists.
    pub fn insert_course(&mut self, name: &str, semester_count: u32) {
        self.courses
            .get_or_insert_with(name, || CourseEntry {
                semester_count,
                subjects: BTreeMap::new(),
            })
            .semester_count = semester_count;
    }

    pub fn courses(&self) -> Vec<&str> {
        self.courses.names()
    }

    pub fn course(&self, name: &str) -> Option<CourseInfo> {
        self.courses.get(name).map(|c| CourseInfo {
            semester_count: c.semester_count,
        })
    }

    pub fn semesters(&self, course: &str) -> Vec<u32> {
        self.course(course)
            .map(|info| (1..=info.semester_count).collect())
            .unwrap_or_default()
    }

    pub fn subjects(&self, course: &str, semester: u32) -> Vec<&str> {
        self.courses
            .get(course)
            .and_then(|c| c.subjects.get(&semester))
            .map(|subjects| subjects.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if let Some(course) = self.courses.first_duplicate() {
            return Err(CatalogError::duplicate(Level::Course, course));
        }
        for (name, course) in &self.courses.0 {
            if course.semester_count == 0 {
                return Err(CatalogError::EmptyCourse {
                    course: name.clone(),
                });
            }
            for (semester, subjects) in &course.subjects {
                if *semester == 0 || *semester > course.semester_count {
                    return Err(CatalogError::SemesterOutOfRange {
                        course: name.clone(),
                        semester: *semester,
                        semester_count: course.semester_count,
                    });
                }
                if let Some(subject) = first_duplicate(subjects.iter().map(String::as_str)) {
                    return Err(CatalogError::duplicate(Level::Subject, subject));
                }
            }
        }
        Ok(())
    }
}

/// Both lookup tables. They are independent and only meet inside the selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub institutions: InstitutionDirectory,
    #[serde(default)]
    pub courses: CourseCatalog,
}

impl Catalog {
    pub fn new(
        institutions: InstitutionDirectory,
        courses: CourseCatalog,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            institutions,
            courses,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(raw)?;
        catalog.validate()?;
        debug!(
            regions = catalog.institutions.regions.len(),
            courses = catalog.courses.courses.len(),
            "catalog: loaded lookup tables"
        );
        Ok(catalog)
    }

    /// Lookup tables shipped with the crate.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json_str(BUNDLED_CATALOG)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        self.institutions.validate()?;
        self.courses.validate()
    }
}

#[cfg(test)]
#[path = "tests/hierarchy_tests.rs"]
mod tests;
