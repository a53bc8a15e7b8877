//! Static facts about the Mars rovers the photo API serves.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoverInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub landing_date: &'static str,
    pub max_sol: u32,
    pub cameras: &'static [&'static str],
}

impl RoverInfo {
    pub fn has_camera(&self, camera: &str) -> bool {
        self.cameras.iter().any(|c| c.eq_ignore_ascii_case(camera))
    }
}

const MER_CAMERAS: &[&str] = &["FHAZ", "RHAZ", "NAVCAM", "PANCAM", "MINITES"];

pub static ROVERS: [RoverInfo; 3] = [
    RoverInfo {
        key: "curiosity",
        name: "Curiosity",
        landing_date: "2012-08-05",
        max_sol: 3000,
        cameras: &["FHAZ", "RHAZ", "MAST", "CHEMCAM", "MAHLI", "MARDI", "NAVCAM"],
    },
    RoverInfo {
        key: "opportunity",
        name: "Opportunity",
        landing_date: "2004-01-25",
        max_sol: 5111,
        cameras: MER_CAMERAS,
    },
    RoverInfo {
        key: "spirit",
        name: "Spirit",
        landing_date: "2004-01-04",
        max_sol: 2208,
        cameras: MER_CAMERAS,
    },
];

pub fn rover(key: &str) -> Option<&'static RoverInfo> {
    ROVERS.iter().find(|r| r.key.eq_ignore_ascii_case(key))
}
