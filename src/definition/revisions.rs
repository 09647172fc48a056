use crate::definition::Recipe;

/// A recipe revision shipped inside the binary.
#[derive(Debug, Clone, Copy)]
pub struct Revision {
    pub version: &'static str,
    pub file_name: &'static str,
    pub source: &'static str,
}

impl Revision {
    pub fn load(&self) -> miette::Result<Recipe> {
        Recipe::from_source(self.source, self.file_name)
    }
}

pub const REVISIONS: &[Revision] = &[
    Revision {
        version: "0.1.2",
        file_name: "csio-0.1.2.kdl",
        source: include_str!("../../recipes/csio-0.1.2.kdl"),
    },
    Revision {
        version: "0.1.3",
        file_name: "csio-0.1.3.kdl",
        source: include_str!("../../recipes/csio-0.1.3.kdl"),
    },
    Revision {
        version: "0.1.4",
        file_name: "csio-0.1.4.kdl",
        source: include_str!("../../recipes/csio-0.1.4.kdl"),
    },
];

pub fn find(version: &str) -> Option<&'static Revision> {
    REVISIONS.iter().find(|x| x.version == version)
}

pub fn latest() -> &'static Revision {
    &REVISIONS[REVISIONS.len() - 1]
}
