//! Command-line interface for fwsign.
//!
//! Generates signing keys, signs raw firmware binaries into secure-boot
//! images, and dumps the header and trailer of a signed image.

use clap::{Parser, Subcommand, ValueEnum};
use fwsign::crypto::compute_digest;
use fwsign::format::IMAGE_HEADER_SIZE;
use fwsign::{
    Certificate, HashAlgorithm, Image, ImageHeader, ImageOptions, ImageType, Key, KeyAlgorithm,
    SignInput, SignatureAlgorithm, SigningMode, TlvBlock, TlvKind,
};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fwsign")]
#[command(about = "Secure-boot firmware image signing tool")]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a new private key
    Keygen {
        /// Output key file (PKCS#8 PEM)
        #[arg(short, long)]
        key: PathBuf,

        /// Key algorithm
        #[arg(short = 't', long = "type", value_enum, default_value = "ecdsa-p256")]
        algorithm: KeyKind,

        /// Encrypt the key with this passphrase
        #[arg(long)]
        passphrase: Option<String>,
    },

    /// Export the public half of a key
    Getpub {
        /// Key file (private or public)
        #[arg(short, long)]
        key: PathBuf,

        /// Passphrase for an encrypted key
        #[arg(long)]
        passphrase: Option<String>,

        /// Write the public key here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a certificate signing request for a key
    Csr {
        /// Private key file
        #[arg(short, long)]
        key: PathBuf,

        /// Passphrase for an encrypted key
        #[arg(long)]
        passphrase: Option<String>,

        /// Output CSR file (PEM)
        #[arg(short, long)]
        output: PathBuf,

        /// Subject distinguished name
        #[arg(short, long, default_value = "CN=fwsign")]
        subject: String,

        /// DNS subjectAltName, may be repeated
        #[arg(long = "dns")]
        dns_names: Vec<String>,
    },

    /// Sign a raw firmware binary
    Sign(SignArgs),

    /// Print the header and trailer of a signed image
    Inspect {
        /// Signed image
        input: PathBuf,

        /// Reserved header region the image was signed with
        #[arg(short = 'H', long, default_value = "32", value_parser = parse_int::<u16>)]
        header_size: u16,

        /// Verify the signature with this key
        #[arg(short, long)]
        key: Option<PathBuf>,

        /// Passphrase for an encrypted verification key
        #[arg(long)]
        passphrase: Option<String>,
    },
}

#[derive(clap::Args)]
struct SignArgs {
    /// Raw firmware binary
    input: PathBuf,

    /// Signed image
    output: PathBuf,

    /// Image type
    #[arg(short = 't', long = "type", value_enum)]
    image_type: ImageKind,

    /// Firmware version word (major << 24 | minor << 16 | revision)
    #[arg(short = 'V', long, value_parser = parse_int::<u32>)]
    version: u32,

    /// Reserved header region in front of the firmware
    #[arg(short = 'H', long, default_value = "32", value_parser = parse_int::<u16>)]
    header_size: u16,

    /// Input already starts with the zeroed header region
    #[arg(long)]
    included_header: bool,

    /// Digest algorithm
    #[arg(long, value_enum, default_value = "sha256")]
    hash: HashKind,

    /// Signature algorithm code for the header
    #[arg(long, value_enum, default_value = "ecdsa256")]
    sig: SigKind,

    /// Signing key
    #[arg(short, long)]
    key: Option<PathBuf>,

    /// Passphrase for the signing key
    #[arg(long)]
    passphrase: Option<String>,

    /// Certificate to embed instead of the bare public key
    #[arg(long)]
    cert: Option<PathBuf>,

    /// Key owning the certificate
    #[arg(long)]
    cert_key: Option<PathBuf>,

    /// Passphrase for the certificate key
    #[arg(long)]
    cert_passphrase: Option<String>,

    /// Pad the signed image with 0xFF to this size
    #[arg(long, value_parser = parse_int::<usize>)]
    pad: Option<usize>,

    /// Alignment for --pad
    #[arg(long, default_value = "1", value_parser = ["1", "2", "4", "8"])]
    align: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum KeyKind {
    Ed25519,
    EcdsaP256,
    Rsa2048,
}

impl From<KeyKind> for KeyAlgorithm {
    fn from(kind: KeyKind) -> Self {
        match kind {
            KeyKind::Ed25519 => KeyAlgorithm::Ed25519,
            KeyKind::EcdsaP256 => KeyAlgorithm::EcdsaP256,
            KeyKind::Rsa2048 => KeyAlgorithm::Rsa2048,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ImageKind {
    Mbl,
    Img,
}

impl From<ImageKind> for ImageType {
    fn from(kind: ImageKind) -> Self {
        match kind {
            ImageKind::Mbl => ImageType::BootManager,
            ImageKind::Img => ImageType::Application,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum HashKind {
    Sha256,
    Sha512,
}

impl From<HashKind> for HashAlgorithm {
    fn from(kind: HashKind) -> Self {
        match kind {
            HashKind::Sha256 => HashAlgorithm::Sha256,
            HashKind::Sha512 => HashAlgorithm::Sha512,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SigKind {
    Ed25519,
    Ecdsa256,
}

impl From<SigKind> for SignatureAlgorithm {
    fn from(kind: SigKind) -> Self {
        match kind {
            SigKind::Ed25519 => SignatureAlgorithm::Ed25519,
            SigKind::Ecdsa256 => SignatureAlgorithm::EcdsaP256,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Keygen {
            key,
            algorithm,
            passphrase,
        } => {
            let passphrase = passphrase.map(SecretString::new);
            Key::generate(algorithm.into())?.export_private(&key, passphrase.as_ref())?;
            println!("Generated: {}", key.display());
        }
        Command::Getpub {
            key,
            passphrase,
            output,
        } => {
            let passphrase = passphrase.map(SecretString::new);
            let key = Key::load(&key, passphrase.as_ref())?;
            match output {
                Some(path) => key.export_public(&path)?,
                None => print!("{}", key.public_pem()?),
            }
        }
        Command::Csr {
            key,
            passphrase,
            output,
            subject,
            dns_names,
        } => {
            let passphrase = passphrase.map(SecretString::new);
            Key::load(&key, passphrase.as_ref())?.create_csr(&output, &subject, &dns_names)?;
            println!("CSR: {}", output.display());
        }
        Command::Sign(args) => sign(args)?,
        Command::Inspect {
            input,
            header_size,
            key,
            passphrase,
        } => {
            let passphrase = passphrase.map(SecretString::new);
            inspect(
                &input,
                header_size as usize,
                key.as_deref(),
                passphrase.as_ref(),
            )?
        }
    }

    Ok(())
}

fn sign(args: SignArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = ImageOptions::new(args.image_type.into(), args.version)
        .header_size(args.header_size)
        .hash_algorithm(args.hash.into())
        .signature_algorithm(args.sig.into())
        .included_header(args.included_header);

    let passphrase = args.passphrase.map(SecretString::new);
    let cert_passphrase = args.cert_passphrase.map(SecretString::new);

    let key = args
        .key
        .as_ref()
        .map(|path| Key::load(path, passphrase.as_ref()))
        .transpose()?;
    let certificate = args.cert.as_ref().map(Certificate::load).transpose()?;
    let certificate_key = args
        .cert_key
        .as_ref()
        .map(|path| Key::load(path, cert_passphrase.as_ref()))
        .transpose()?;

    let mut image = Image::load(&args.input, options)?;
    image.sign(key.as_ref(), certificate.as_ref(), certificate_key.as_ref())?;

    if let Some(size) = args.pad {
        image.pad_to(size, args.align.parse()?)?;
    }

    image.save(&args.output)?;
    println!("Signed: {}", args.output.display());
    Ok(())
}

fn inspect(
    input: &Path,
    header_size: usize,
    key: Option<&Path>,
    passphrase: Option<&SecretString>,
) -> Result<(), Box<dyn std::error::Error>> {
    if header_size < IMAGE_HEADER_SIZE {
        return Err(format!("header size must be at least {}", IMAGE_HEADER_SIZE).into());
    }
    let data = std::fs::read(input)?;
    if data.len() < header_size {
        return Err(format!("{} is shorter than its header region", input.display()).into());
    }

    let start = header_size - IMAGE_HEADER_SIZE;
    let header = ImageHeader::parse(&data[start..header_size])?;
    let firmware_end = header_size + header.firmware_size as usize;
    if data.len() < firmware_end {
        return Err(format!("{} is truncated", input.display()).into());
    }
    let trailer = TlvBlock::parse(&data[firmware_end..])?;

    println!("Image type:        {}", header.image_type);
    println!(
        "Version:           {}.{}.{}",
        header.major, header.minor, header.revision
    );
    println!("Hash algorithm:    {}", header.hash_algorithm);
    println!("Signature:         {}", header.signature_algorithm);
    println!("Total size:        0x{:x}", header.total_size);
    println!("Firmware size:     0x{:x}", header.firmware_size);
    println!("Trailer size:      0x{:x}", header.trailer_size);
    println!("Trailer records:");
    for record in trailer.records() {
        println!("  {:<22} {} bytes", format!("{:?}", record.kind), record.value.len());
    }

    let region = &data[start..firmware_end];
    let digest = compute_digest(header.hash_algorithm, region);
    let digest_ok = trailer.find(TlvKind::Digest) == Some(digest.as_slice());
    println!("Digest:            {}", if digest_ok { "OK" } else { "MISMATCH" });

    if let Some(path) = key {
        let key = Key::load(path, passphrase)?.to_public();
        let signature = trailer
            .find(TlvKind::Signature)
            .ok_or("trailer has no signature record")?;
        let input = match key.signing_mode() {
            SigningMode::Digest => SignInput::Digest(&digest),
            SigningMode::FullContent => SignInput::Content(region),
        };
        match key.verify(signature, input) {
            Ok(()) => println!("Signature:         OK"),
            Err(e) => println!("Signature:         FAILED ({})", e),
        }
    }

    Ok(())
}

/// Parse a decimal or `0x`-prefixed hexadecimal integer.
fn parse_int<T>(s: &str) -> Result<T, String>
where
    T: TryFrom<u64>,
{
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    }
    .map_err(|e| format!("invalid number '{}': {}", s, e))?;
    T::try_from(value).map_err(|_| format!("{} is out of range", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_image(dir: &Path, key: &Key) -> PathBuf {
        let options = ImageOptions::new(ImageType::Application, 0x0100_0000);
        let mut image = Image::from_bytes(vec![0x5a; 64], options).unwrap();
        image.sign(Some(key), None, None).unwrap();
        let path = dir.join("fw.signed");
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn test_inspect_with_encrypted_key() {
        let dir = tempfile::tempdir().unwrap();
        let key = Key::generate(KeyAlgorithm::Ed25519).unwrap();
        let key_path = dir.path().join("key.pem");
        let passphrase = SecretString::new("hunter2".to_string());
        key.export_private(&key_path, Some(&passphrase)).unwrap();
        let image = signed_image(dir.path(), &key);

        inspect(&image, 32, Some(&key_path), Some(&passphrase)).unwrap();
        assert!(inspect(&image, 32, Some(&key_path), None).is_err());
    }

    #[test]
    fn test_inspect_accepts_passphrase_flag() {
        let cli = Cli::try_parse_from([
            "fwsign",
            "inspect",
            "fw.signed",
            "--key",
            "key.pem",
            "--passphrase",
            "hunter2",
        ])
        .unwrap();
        let Command::Inspect { passphrase, .. } = cli.command else {
            panic!("expected inspect");
        };
        assert_eq!(passphrase.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_csr_command_arguments() {
        let cli = Cli::try_parse_from([
            "fwsign",
            "csr",
            "-k",
            "key.pem",
            "-o",
            "key.csr",
            "--dns",
            "a.example.com",
            "--dns",
            "b.example.com",
        ])
        .unwrap();
        let Command::Csr {
            subject, dns_names, ..
        } = cli.command
        else {
            panic!("expected csr");
        };
        assert_eq!(subject, "CN=fwsign");
        assert_eq!(dns_names, ["a.example.com", "b.example.com"]);
    }
}
