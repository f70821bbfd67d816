use serde::{Deserialize, Serialize};

use crate::{cmd, error::InstallerError};

// ── Data types ────────────────────────────────────────────────────────────────

/// A candidate installation disk as reported by `lsblk`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    pub name:  String, // sda
    pub size:  String, // 20G
    pub model: String, // SAMSUNG SSD 870
}

impl Disk {
    /// One-line label shown in the arrow-key selector.
    pub fn display(&self) -> String {
        format!("{:<12}  {:>8}   {}", format!("/dev/{}", self.name), self.size, self.model)
    }
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkDevice {
    name: String,
    size: Option<String>,
    model: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Returns all whole disks visible to the system, skipping loop, RAM,
/// zram and optical devices.
pub fn list_disks() -> Result<Vec<Disk>, InstallerError> {
    let output = cmd::run_capture("lsblk", &["-d", "-J", "-o", "NAME,SIZE,MODEL,TYPE"])?;
    let disks = parse_lsblk_output(&output)?;
    tracing::info!(count = disks.len(), "disks detected");
    Ok(disks)
}

fn parse_lsblk_output(output: &str) -> Result<Vec<Disk>, InstallerError> {
    let parsed: LsblkOutput = serde_json::from_str(output)?;

    Ok(parsed
        .blockdevices
        .into_iter()
        .filter(|d| d.kind.as_deref().map_or(true, |k| k == "disk"))
        .filter(|d| !["loop", "ram", "zram", "sr"].iter().any(|p| d.name.starts_with(p)))
        .map(|d| Disk {
            name: d.name,
            size: d.size.unwrap_or_else(|| "Unknown".to_string()),
            model: d
                .model
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lsblk_output() {
        let output = indoc::indoc!(
            r#"
            {
               "blockdevices": [
                  {"name":"loop0", "size":"2.4G", "model":null, "type":"loop"},
                  {"name":"sda", "size":"238.5G", "model":"SAMSUNG SSD 870  ", "type":"disk"},
                  {"name":"sr0", "size":"1024M", "model":"DVD-RAM", "type":"rom"},
                  {"name":"nvme0n1", "size":"1.8T", "model":null, "type":"disk"},
                  {"name":"zram0", "size":"7.7G", "model":null, "type":"disk"}
               ]
            }
            "#
        );

        let disks = parse_lsblk_output(output).unwrap();
        assert_eq!(
            disks,
            vec![
                Disk {
                    name: "sda".into(),
                    size: "238.5G".into(),
                    model: "SAMSUNG SSD 870".into(),
                },
                Disk {
                    name: "nvme0n1".into(),
                    size: "1.8T".into(),
                    model: "Unknown".into(),
                },
            ]
        );
    }

    #[test]
    fn missing_type_column_is_tolerated() {
        let disks = parse_lsblk_output(r#"{"blockdevices":[{"name":"vda","size":"20G"}]}"#).unwrap();
        assert_eq!(disks.len(), 1);
        assert_eq!(disks[0].model, "Unknown");
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_lsblk_output("NAME SIZE MODEL").is_err());
    }

    #[test]
    fn display_shows_device_path() {
        let disk = Disk {
            name: "sda".into(),
            size: "20G".into(),
            model: "QEMU HARDDISK".into(),
        };
        assert!(disk.display().starts_with("/dev/sda"));
        assert!(disk.display().ends_with("QEMU HARDDISK"));
    }
}
