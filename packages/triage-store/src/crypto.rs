//! Módulo de criptografia para o histórico de conversas
//!
//! Este módulo implementa o envelope simétrico usado para proteger o
//! histórico de sessões no armazenamento durável. O texto selado é
//! `base64(nonce || ciphertext)`, com chave derivada de uma frase fixa
//! da aplicação.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{ChaCha20Poly1305, Key as ChaChaKey, Nonce as ChaChaNonce};
use rand::{rngs::OsRng as RandOsRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Erros específicos para operações de criptografia
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Falha na criptografia: {0}")]
    EncryptionFailed(String),

    #[error("Falha na descriptografia: {0}")]
    DecryptionFailed(String),

    #[error("Dados inválidos: {0}")]
    InvalidData(String),

    #[error("Configuração de criptografia inválida: {0}")]
    InvalidConfiguration(String),
}

/// Tamanho do nonce em bytes (igual para AES-GCM e ChaCha20-Poly1305)
const NONCE_SIZE: usize = 12;

/// Algoritmo usado para selar o histórico
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cipher {
    /// AES-256-GCM
    #[default]
    Aes256Gcm,
    /// ChaCha20-Poly1305
    ChaCha20Poly1305,
}

impl fmt::Display for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cipher::Aes256Gcm => write!(f, "aes-256-gcm"),
            Cipher::ChaCha20Poly1305 => write!(f, "chacha20-poly1305"),
        }
    }
}

impl FromStr for Cipher {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-256-gcm" | "aes" => Ok(Cipher::Aes256Gcm),
            "chacha20-poly1305" | "chacha" => Ok(Cipher::ChaCha20Poly1305),
            other => Err(CryptoError::InvalidConfiguration(format!(
                "Algoritmo desconhecido: {}",
                other
            ))),
        }
    }
}

/// Chave de 256 bits (com zeroização automática)
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Cria uma nova chave aleatória
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        RandOsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Cria uma chave a partir de bytes existentes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidData(format!(
                "A chave deve ter 32 bytes, recebeu {}",
                bytes.len()
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    /// Deriva a chave da frase da aplicação (SHA-256)
    pub fn from_phrase(phrase: &str) -> Result<Self, CryptoError> {
        if phrase.is_empty() {
            return Err(CryptoError::InvalidConfiguration(
                "Frase de chave vazia".to_string(),
            ));
        }

        let mut digest = Sha256::digest(phrase.as_bytes());
        let key = Self::from_bytes(&digest);
        digest.as_mut_slice().zeroize();
        key
    }

    /// Converte para bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(***)")
    }
}

/// Estrutura que armazena dados criptografados e seu nonce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedData {
    /// Dados criptografados
    pub ciphertext: Vec<u8>,
    /// Nonce usado na criptografia
    pub nonce: Vec<u8>,
}

impl EncryptedData {
    /// Codifica como texto: `base64(nonce || ciphertext)`
    pub fn to_blob(&self) -> String {
        let mut raw = Vec::with_capacity(self.nonce.len() + self.ciphertext.len());
        raw.extend_from_slice(&self.nonce);
        raw.extend_from_slice(&self.ciphertext);
        STANDARD.encode(raw)
    }

    /// Decodifica o texto produzido por [`EncryptedData::to_blob`]
    pub fn from_blob(blob: &str) -> Result<Self, CryptoError> {
        let raw = STANDARD
            .decode(blob.trim())
            .map_err(|e| CryptoError::InvalidData(format!("Base64 inválido: {}", e)))?;

        if raw.len() <= NONCE_SIZE {
            return Err(CryptoError::InvalidData(format!(
                "Blob muito curto: {} bytes",
                raw.len()
            )));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_SIZE);
        Ok(Self {
            ciphertext: ciphertext.to_vec(),
            nonce: nonce.to_vec(),
        })
    }
}

/// Criptografa dados com o algoritmo escolhido
pub fn encrypt(data: &[u8], key: &EncryptionKey, cipher: Cipher) -> Result<EncryptedData, CryptoError> {
    match cipher {
        Cipher::Aes256Gcm => {
            let aes_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
            let aead = Aes256Gcm::new(aes_key);
            let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

            let ciphertext = aead
                .encrypt(&nonce, data)
                .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

            Ok(EncryptedData {
                ciphertext,
                nonce: nonce.to_vec(),
            })
        }
        Cipher::ChaCha20Poly1305 => {
            let chacha_key = ChaChaKey::from_slice(key.as_bytes());
            let aead = ChaCha20Poly1305::new(chacha_key);
            let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);

            let ciphertext = aead
                .encrypt(&nonce, data)
                .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

            Ok(EncryptedData {
                ciphertext,
                nonce: nonce.to_vec(),
            })
        }
    }
}

/// Descriptografa dados com o algoritmo escolhido
pub fn decrypt(encrypted: &EncryptedData, key: &EncryptionKey, cipher: Cipher) -> Result<Vec<u8>, CryptoError> {
    if encrypted.nonce.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidData(format!(
            "Nonce inválido: esperado {} bytes, recebido {}",
            NONCE_SIZE,
            encrypted.nonce.len()
        )));
    }

    let plaintext = match cipher {
        Cipher::Aes256Gcm => {
            let aes_key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
            Aes256Gcm::new(aes_key).decrypt(
                Nonce::from_slice(&encrypted.nonce),
                encrypted.ciphertext.as_ref(),
            )
        }
        Cipher::ChaCha20Poly1305 => {
            let chacha_key = ChaChaKey::from_slice(key.as_bytes());
            ChaCha20Poly1305::new(chacha_key).decrypt(
                ChaChaNonce::from_slice(&encrypted.nonce),
                encrypted.ciphertext.as_ref(),
            )
        }
    };

    plaintext.map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Envelope de texto: sela e abre strings UTF-8 com uma chave fixa
#[derive(Debug, Clone)]
pub struct Envelope {
    key: EncryptionKey,
    cipher: Cipher,
}

impl Envelope {
    pub fn new(key: EncryptionKey, cipher: Cipher) -> Self {
        Self { key, cipher }
    }

    /// Cria o envelope a partir da frase de chave da aplicação
    pub fn from_phrase(phrase: &str, cipher: Cipher) -> Result<Self, CryptoError> {
        Ok(Self::new(EncryptionKey::from_phrase(phrase)?, cipher))
    }

    pub fn cipher(&self) -> Cipher {
        self.cipher
    }

    /// Sela o texto e retorna o blob em base64
    pub fn seal(&self, plaintext: &str) -> Result<String, CryptoError> {
        Ok(encrypt(plaintext.as_bytes(), &self.key, self.cipher)?.to_blob())
    }

    /// Abre um blob produzido por [`Envelope::seal`]
    pub fn open(&self, blob: &str) -> Result<String, CryptoError> {
        let encrypted = EncryptedData::from_blob(blob)?;
        let plaintext = decrypt(&encrypted, &self.key, self.cipher)?;
        String::from_utf8(plaintext)
            .map_err(|e| CryptoError::InvalidData(format!("UTF-8 inválido: {}", e)))
    }
}
