use serde::Deserialize;

use crate::error::PresetError;
use crate::synth::voice_config::{VoiceConfig, PRESET_VALUES};

pub const ZONES: usize = 4;

/// A preset and the lowest internal note it plays.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    pub split: u8,
    pub config: VoiceConfig,
}

/// Four key zones making up one instrument. Zones are ordered by split
/// point; the first zone's split is never consulted.
#[derive(Clone, Debug, PartialEq)]
pub struct Bank {
    zones: [Zone; ZONES],
}

/// Serialized form of a [`Zone`]: the split point and the 70 preset values.
#[derive(Clone, Debug, Deserialize)]
pub struct ZoneSpec {
    pub split: u8,
    pub values: Vec<f32>,
}

impl Bank {
    pub fn new(zones: [Zone; ZONES]) -> Self {
        Self { zones }
    }

    /// One preset across the whole keyboard.
    pub fn single(config: VoiceConfig) -> Self {
        Self::new([0, 0, 0, 0].map(|split| Zone {
            split,
            config: config.clone(),
        }))
    }

    /// Parses `[{"split": 0, "values": [...70 floats]}, ...]` with exactly four zones.
    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        Self::from_specs(serde_json::from_str(json)?)
    }

    /// Builds a bank from exactly four zone specs; nothing is kept on error.
    pub fn from_specs(specs: Vec<ZoneSpec>) -> Result<Self, PresetError> {
        if specs.len() != ZONES {
            return Err(PresetError::ZoneCount(specs.len()));
        }
        let mut zones = Vec::with_capacity(ZONES);
        for spec in specs {
            zones.push(Zone {
                split: spec.split,
                config: VoiceConfig::from_values(&spec.values)?,
            });
        }
        let zones: [Zone; ZONES] = zones
            .try_into()
            .map_err(|zones: Vec<Zone>| PresetError::ZoneCount(zones.len()))?;
        Ok(Self::new(zones))
    }

    /// The built-in acoustic piano.
    pub fn piano() -> Self {
        Self::new([
            Zone {
                split: 0,
                config: VoiceConfig::from_array(&PIANO_0),
            },
            Zone {
                split: 24,
                config: VoiceConfig::from_array(&PIANO_1),
            },
            Zone {
                split: 45,
                config: VoiceConfig::from_array(&PIANO_2),
            },
            Zone {
                split: 56,
                config: VoiceConfig::from_array(&PIANO_3),
            },
        ])
    }

    /// Picks the zone for `note` by bisecting the three interior split points.
    pub fn zone_index(&self, note: u8) -> usize {
        if self.zones[2].split > note {
            if self.zones[1].split > note {
                0
            } else {
                1
            }
        } else if self.zones[3].split > note {
            2
        } else {
            3
        }
    }

    pub fn select(&self, note: u8) -> &VoiceConfig {
        &self.zones[self.zone_index(note)].config
    }

    pub fn zones(&self) -> &[Zone; ZONES] {
        &self.zones
    }

    pub fn zone_mut(&mut self, index: usize) -> Option<&mut Zone> {
        self.zones.get_mut(index)
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::piano()
    }
}

#[rustfmt::skip]
const PIANO_0: [f32; PRESET_VALUES] = [
    0.9796082, 0.027333, 3.1014066e-04, 0.3553782, 0.0, 0.0,
    0.999701, 0.0, 0.0, 0.0952946, 0.0019682, 0.0344333, 0.1222082, 1.0472875, 0.1374503, 0.0018104, 0.0621257, 0.5214623, 0.4422576, 0.0798205, 0.0, 0.0,
    1.0054471, 0.0, 0.0, 0.5863671, 0.9928878, 0.9980734, 3.9977785, 0.0306404, 0.0639717, 0.0039026, 0.4017407, 0.1531342, 0.0185301, 0.1214061, 0.0, 2.0,
    0.2660897, 0.0, 0.0, 0.7332967, 0.9828789, 0.5512452, 1.4921884, 2.5392514, 0.8627927, 0.0123824, 0.318959, 0.6230813, 0.1354245, 0.5086474, 0.0, 1.0,
    1.0056306, 0.0, 0.0, 0.2150809, 0.155934, 0.0171293, 0.2404514, 3.9270459, 0.2475623, 0.0172155, 0.0608255, 0.3450612, 0.2006269, 0.0601531, 0.0, 0.0,
];

#[rustfmt::skip]
const PIANO_1: [f32; PRESET_VALUES] = [
    0.0156041, 0.4687458, 0.1250004, 0.0468734, 0.0, 0.0,
    0.201306, 0.0, 0.0, 0.0284362, 1.7868821e-05, 1.8013642e-05, 0.0017878, 0.6610319, 0.2498922, 0.0199585, 0.1282028, 1.2986114e-04, 0.3335928, 0.5159912, 0.0, 2.0,
    2.0, 0.0, 0.0, 0.1796875, 0.0039232, 0.1330602, 1.2518352, 3.0010064, 0.3985858, 0.0417325, 0.6664157, 0.0583343, 0.1458065, 1.0010166e-06, 0.0, 0.0,
    5.0215235, 0.0, 0.0, 0.1250431, 0.0625124, 1.1302997e-05, 0.9994371, 3.9995268, 0.3796004, 0.0509822, 0.6655889, 8.3570681e-07, 2.5288513e-07, 0.2086921, 0.0, 0.0,
    2.0014379, 0.0, 0.0, 0.9999135, 0.9993215, 0.9999304, 3.9995883, 3.0080235, 0.003861, 0.0247912, 0.2709723, 0.6666109, 3.8641353e-05, 0.1808434, 0.0, 2.0,
];

#[rustfmt::skip]
const PIANO_2: [f32; PRESET_VALUES] = [
    0.0312291, 0.0312435, 0.8428526, 0.5000056, 0.0, 0.0,
    1.0054299, 0.0, 0.0, 0.9998373, 0.9999974, 0.9999899, 1.0574003, 3.9994107, 0.999982, 0.0136532, 0.066683, 1.7181039e-05, 0.0151768, 0.6327946, 0.0, 2.0,
    1.0050896, 0.0, 0.0, 0.1249091, 0.7505561, 0.9996063, 3.9989203, 3.9112103e-04, 0.1245966, 0.0070038, 0.344417, 0.0999991, 0.3332958, 0.0306326, 0.0, 0.0,
    1.0, 0.0, 0.0, 0.1249975, 0.0781287, 0.1250022, 0.4375192, 3.9986823, 0.1249998, 0.0172563, 1.3981066e-04, 0.0289136, 0.1001681, 0.5374452, 0.0, 0.0,
    0.1495607, 0.0, 0.0, 0.1813896, 0.0012362, 6.1609249e-04, 8.3872957e-04, 0.3439013, 0.0779141, 0.0048954, 0.3231604, 0.2959239, 0.005716, 0.0418665, 0.0, 4.0,
];

#[rustfmt::skip]
const PIANO_3: [f32; PRESET_VALUES] = [
    0.9998872, 0.1328185, 0.1091074, 0.0031796, 0.0, 0.0,
    1.0, 0.0, 0.0, 0.1800623, 0.001678, 0.0602197, 0.0039134, 0.4558271, 0.7500252, 3.0845764e-04, 0.0306528, 0.0054125, 0.0172467, 0.6133548, 0.0, 0.0,
    1.0027121, 0.0, 0.0, 0.7744199, 0.2499444, 0.1170707, 1.5017331, 3.9994185, 0.4383087, 0.0027611, 0.4763643, 0.0702953, 0.1200011, 6.0301752e-06, 0.0, 0.0,
    1.0069851, 0.0, 0.0, 0.1226282, 0.3283757, 0.0019901, 0.8027105, 0.438731, 0.8325416, 0.0094569, 0.1224948, 0.4943282, 0.1000211, 0.6183775, 0.0, 0.0,
    0.0647725, 0.0, 0.0, 0.9993695, 0.9999353, 0.999666, 3.9999958, 3.9875672, 0.0547375, 0.0013088, 0.1252818, 0.0268754, 0.2647462, 0.2497633, 0.0, 3.0,
];
