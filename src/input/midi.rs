use log::{info, warn};
use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use std::error::Error;
use std::sync::mpsc::Sender;

/// Forwards every message from the first MIDI input port as raw bytes.
pub struct MidiHandler {
    /// Holds the connection to keep it alive
    connection: Option<MidiInputConnection<()>>,
}

impl MidiHandler {
    pub fn new(midi_sender: Sender<Vec<u8>>) -> Self {
        match Self::try_new(midi_sender) {
            Ok(handler) => handler,
            Err(e) => {
                warn!("failed to initialize MIDI: {e}. MIDI input is disabled");
                Self { connection: None }
            }
        }
    }

    fn try_new(midi_sender: Sender<Vec<u8>>) -> Result<Self, Box<dyn Error>> {
        let midi_in = MidiInput::new("fourop input")?;
        let port = Self::select_input_port(&midi_in)?;
        let port_name = midi_in.port_name(&port)?;

        let connection = midi_in.connect(
            &port,
            "fourop-read-input",
            move |_, message, _| {
                // the receiver only goes away at shutdown
                let _ = midi_sender.send(message.to_vec());
            },
            (),
        )?;

        info!("opened MIDI port: {port_name}");
        Ok(Self {
            connection: Some(connection),
        })
    }

    fn select_input_port(midi_in: &MidiInput) -> Result<MidiInputPort, Box<dyn Error>> {
        let in_ports = midi_in.ports();
        for (i, port) in in_ports.iter().enumerate() {
            info!("MIDI input {i}: {}", midi_in.port_name(port)?);
        }
        in_ports
            .into_iter()
            .next()
            .ok_or_else(|| "no MIDI input ports found".into())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}
