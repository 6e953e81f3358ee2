use std::fmt;

use crate::byteio::{Reader, Writer};

/// How the transport protected a message before it reached a mailbox.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Encryption {
    #[default]
    Plaintext,
    Symmetric,
    Asymmetric,
}

impl Encryption {
    fn as_u8(&self) -> u8 {
        match self {
            Self::Plaintext => 0,
            Self::Symmetric => 1,
            Self::Asymmetric => 2,
        }
    }

    fn from_u8(value: u8) -> Result<Self, String> {
        match value {
            0 => Ok(Self::Plaintext),
            1 => Ok(Self::Symmetric),
            2 => Ok(Self::Asymmetric),
            _ => Err("Unsupported encryption type".to_string()),
        }
    }
}

impl fmt::Display for Encryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plaintext => write!(f, "plaintext"),
            Self::Symmetric => write!(f, "symmetric"),
            Self::Asymmetric => write!(f, "asymmetric"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Type tag used by receivers to classify the payload.
    pub kind: String,
    /// Contact id of the sender, filled by the transport.
    pub from: String,
    /// Mailbox address the message is routed to.
    pub to: String,
    pub encryption: Encryption,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    pub meta: Metadata,
    pub data: Vec<u8>,
}

impl Message {
    const VERSION: u8 = 1;

    pub fn new(kind: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            meta: Metadata {
                kind: kind.into(),
                ..Default::default()
            },
            data,
        }
    }

    pub fn kind(&self) -> &str {
        &self.meta.kind
    }

    pub fn with_encryption(mut self, encryption: Encryption) -> Self {
        self.meta.encryption = encryption;
        self
    }

    pub fn addressed_to(mut self, to: impl Into<String>) -> Self {
        self.meta.to = to.into();
        self
    }

    pub fn sent_from(mut self, from: impl Into<String>) -> Self {
        self.meta.from = from.into();
        self
    }

    pub fn is_symmetric(&self) -> bool {
        self.meta.encryption == Encryption::Symmetric
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut writer = Writer::new(&mut bytes);
        writer.write_u8(Self::VERSION);
        writer.write_string(&self.meta.kind);
        writer.write_string(&self.meta.from);
        writer.write_string(&self.meta.to);
        writer.write_u8(self.meta.encryption.as_u8());
        writer.write_blob(&self.data);
        bytes
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, String> {
        let mut reader = Reader::new(bytes);
        let version = reader.read_u8()?;
        if version != Self::VERSION {
            return Err(format!("Unsupported message version {version}"));
        }
        let kind = reader.read_string()?;
        let from = reader.read_string()?;
        let to = reader.read_string()?;
        let encryption = Encryption::from_u8(reader.read_u8()?)?;
        let data = reader.read_blob()?;
        if !reader.is_empty() {
            return Err("Trailing bytes after message".to_string());
        }
        Ok(Self {
            meta: Metadata {
                kind,
                from,
                to,
                encryption,
            },
            data,
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{type: {}, from: {}, to: {}, encryption: {}, data: {}}}",
            self.meta.kind,
            self.meta.from,
            self.meta.to,
            self.meta.encryption,
            hex::encode(&self.data),
        )
    }
}
