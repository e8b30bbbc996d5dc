use stream_unzip::ZipReader;

/// A file embedded in the map's pakfile lump (custom materials, textures, models...).
#[derive(Clone, Debug, PartialEq)]
pub struct PakEntry {
    pub filename: String,
    pub size: usize,
}

impl PakEntry {
    pub fn is_material(&self) -> bool {
        self.filename.to_ascii_lowercase().ends_with(".vmt")
    }
}

#[derive(Clone, Debug, Default)]
pub struct BSPPak {
    pub entries: Vec<PakEntry>,
}

impl BSPPak {
    /// The pakfile lump is an uncompressed zip archive.
    pub fn read(pakfile_data: &[u8]) -> Self {
        if pakfile_data.is_empty() {
            return Self::default();
        }
        let mut zip_reader = ZipReader::default();

        zip_reader.update(pakfile_data.to_vec().into());

        // Read the whole archive and deal with the entries at the end.
        zip_reader.finish();

        let entries = zip_reader
            .drain_entries()
            .iter()
            .map(|e| PakEntry {
                filename: e.header().filename.clone(),
                size: e.compressed_data().len(),
            })
            .collect();

        Self { entries }
    }

    pub fn materials(&self) -> impl Iterator<Item = &PakEntry> {
        self.entries.iter().filter(|e| e.is_material())
    }
}
