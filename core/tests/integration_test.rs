// ============================================================================
// END-TO-END ENCODING TESTS
// ============================================================================
// The helpers below read the generated sample stream back into bytes: each
// bit spans two half-bit runs, and a bit is "1" when the two runs differ.
// This is only good enough for clean, generated square waves and lives here
// purely to check what the encoder put on tape.
// ============================================================================

use abccas_core::container::{AU_HEADER_SIZE, UNKNOWN_LENGTH, WAV_HEADER_SIZE};
use abccas_core::framing::{BLOCK_SIZE, BLOCK_WIRE_BYTES, DATA_BLOCK_PAYLOAD, ETX, STX, SYNC};
use abccas_core::{CassetteEncoder, CassetteName, ContainerKind, EncoderConfig};
use rand::{Rng, SeedableRng};
use std::io::Cursor;

struct DecodedBlock {
    payload: Vec<u8>,
    transmitted_checksum: u16,
}

fn demodulate_bytes(samples: &[u8], frame_size: usize, half_bit: usize) -> Vec<u8> {
    let frames: Vec<&[u8]> = samples.chunks(frame_size).collect();
    let bits: Vec<bool> = frames
        .chunks(2 * half_bit)
        .map(|bit| bit[0] != bit[half_bit])
        .collect();

    bits.chunks(8)
        .map(|byte_bits| {
            byte_bits
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &b)| acc | ((b as u8) << i))
        })
        .collect()
}

fn split_blocks(bytes: &[u8]) -> Vec<DecodedBlock> {
    assert_eq!(bytes.len() % BLOCK_WIRE_BYTES, 0, "Stream is not a whole number of blocks");

    bytes
        .chunks(BLOCK_WIRE_BYTES)
        .map(|wire| {
            assert!(wire[..32].iter().all(|&b| b == 0), "Leader must be 32 zero bytes");
            assert_eq!(&wire[32..35], &[SYNC; 3]);
            assert_eq!(wire[35], STX);
            assert_eq!(wire[36 + BLOCK_SIZE], ETX);
            let lo = wire[37 + BLOCK_SIZE];
            let hi = wire[38 + BLOCK_SIZE];
            DecodedBlock {
                payload: wire[36..36 + BLOCK_SIZE].to_vec(),
                transmitted_checksum: u16::from_le_bytes([lo, hi]),
            }
        })
        .collect()
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn raw_encoder(bits: u16) -> CassetteEncoder {
    init_logging();
    let config = EncoderConfig::new(700, 11200, bits, ContainerKind::Raw).expect("valid config");
    CassetteEncoder::new(config).expect("Failed to create encoder")
}

fn encode_and_demodulate(data: &[u8], name: &CassetteName) -> Vec<DecodedBlock> {
    let encoder = raw_encoder(8);
    let out = encoder.encode_to_vec(name, data).expect("Failed to encode");
    let bytes = demodulate_bytes(&out, 1, encoder.timing().half_bit_samples() as usize);
    split_blocks(&bytes)
}

fn expected_checksum(payload: &[u8]) -> u16 {
    let sum: u32 = payload.iter().map(|&b| b as u32).sum();
    ((sum + ETX as u32) % 65536) as u16
}

#[test]
fn test_empty_input_is_one_name_block() {
    let blocks = encode_and_demodulate(b"", &CassetteName::new("empty", "bac"));
    assert_eq!(blocks.len(), 1);

    let name = &blocks[0].payload;
    assert_eq!(&name[..3], &[0xFF; 3]);
    assert_eq!(&name[3..11], b"EMPTY   ");
    assert_eq!(&name[11..14], b"BAC");
    assert!(name[14..].iter().all(|&b| b == 0));
}

#[test]
fn test_300_bytes_make_two_data_blocks() {
    let data: Vec<u8> = (0..300).map(|i| (i % 251) as u8 + 1).collect();
    let blocks = encode_and_demodulate(&data, &CassetteName::stdin());
    assert_eq!(blocks.len(), 3, "Name block + 2 data blocks");

    let first = &blocks[1].payload;
    assert_eq!(first[0], 0);
    assert_eq!(u16::from_le_bytes([first[1], first[2]]), 0);
    assert_eq!(&first[3..], &data[..DATA_BLOCK_PAYLOAD]);

    let second = &blocks[2].payload;
    assert_eq!(u16::from_le_bytes([second[1], second[2]]), 1);
    assert_eq!(&second[3..3 + 47], &data[DATA_BLOCK_PAYLOAD..]);
    assert!(second[3 + 47..].iter().all(|&b| b == 0), "Tail must be zero padded");
}

#[test]
fn test_exact_multiple_needs_no_extra_block() {
    let data = vec![0xAAu8; 2 * DATA_BLOCK_PAYLOAD];
    let blocks = encode_and_demodulate(&data, &CassetteName::stdin());
    assert_eq!(blocks.len(), 3);
    assert_eq!(&blocks[2].payload[3..], &data[DATA_BLOCK_PAYLOAD..]);
}

#[test]
fn test_checksums_and_counters_from_modulated_output() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xABC80);
    for _ in 0..4 {
        let len: usize = rng.gen_range(0..2000);
        let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
        let blocks = encode_and_demodulate(&data, &CassetteName::new("random", "bac"));

        assert_eq!(blocks.len(), 1 + len.div_ceil(DATA_BLOCK_PAYLOAD));
        for block in &blocks {
            assert_eq!(block.transmitted_checksum, expected_checksum(&block.payload));
        }

        let mut recovered = Vec::new();
        for (i, block) in blocks[1..].iter().enumerate() {
            assert_eq!(u16::from_le_bytes([block.payload[1], block.payload[2]]) as usize, i);
            recovered.extend_from_slice(&block.payload[3..]);
        }
        recovered.truncate(len);
        assert_eq!(recovered, data);
    }
}

#[test]
fn test_every_width_and_container_has_exact_size() {
    let data = vec![0x55u8; 400];
    for container in [ContainerKind::Wav, ContainerKind::Au, ContainerKind::Raw] {
        for bits in [8u16, 16, 24, 32] {
            let config = EncoderConfig::new(2400, 44100, bits, container).unwrap();
            let encoder = CassetteEncoder::new(config).unwrap();
            let out = encoder.encode_to_vec(&CassetteName::stdin(), &data).unwrap();
            let plan = encoder.plan(data.len());

            let frame_size = bits as usize / 8;
            let header = container.header_size() as usize;
            assert_eq!(out.len() - header, plan.frames as usize * frame_size);
            assert_eq!(out.len() as u64, plan.file_bytes);

            let half_bit = encoder.timing().half_bit_samples() as usize;
            let bytes = demodulate_bytes(&out[header..], frame_size, half_bit);
            let blocks = split_blocks(&bytes);
            assert_eq!(blocks.len(), 3, "{:?} {} bits", container, bits);
        }
    }
}

#[test]
fn test_wav_header_declares_exact_length() {
    let config = EncoderConfig::new(700, 11200, 16, ContainerKind::Wav).unwrap();
    let encoder = CassetteEncoder::new(config).unwrap();
    let data = vec![0x42u8; 1000];
    let out = encoder.encode_to_vec(&CassetteName::stdin(), &data).unwrap();

    let declared = u32::from_le_bytes(out[40..44].try_into().unwrap()) as usize;
    assert_eq!(declared, out.len() - WAV_HEADER_SIZE as usize);

    let reader = hound::WavReader::new(Cursor::new(&out)).expect("hound reads the header");
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 11200);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.len() as u64, encoder.plan(data.len()).frames);
}

#[test]
fn test_wav_8bit_levels() {
    let config = EncoderConfig::new(700, 11200, 8, ContainerKind::Wav).unwrap();
    let encoder = CassetteEncoder::new(config).unwrap();
    let out = encoder.encode_to_vec(&CassetteName::stdin(), b"10 PRINT").unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(&out)).unwrap();
    let samples: Vec<i8> = reader.samples::<i8>().map(|s| s.unwrap()).collect();
    assert!(samples.iter().all(|&s| s == -64 || s == 86));
    assert!(samples.contains(&-64) && samples.contains(&86));

    // Stored unsigned on disk
    assert!(out[44..].iter().all(|&b| b == 64 || b == 214));
}

#[test]
fn test_wav_16bit_levels() {
    let config = EncoderConfig::new(700, 22050, 16, ContainerKind::Wav).unwrap();
    let encoder = CassetteEncoder::new(config).unwrap();
    let out = encoder.encode_to_vec(&CassetteName::stdin(), b"x").unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(&out)).unwrap();
    assert_eq!(reader.spec().sample_rate, 22400);
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert!(samples.iter().all(|&s| s == -16515 || s == 22216));
}

#[test]
fn test_au_8bit_signed_levels() {
    let config = EncoderConfig::new(700, 11200, 8, ContainerKind::Au).unwrap();
    let encoder = CassetteEncoder::new(config).unwrap();
    let out = encoder.encode_to_vec(&CassetteName::stdin(), b"abc").unwrap();

    assert_eq!(&out[..4], b".snd");
    assert_eq!(u32::from_be_bytes(out[8..12].try_into().unwrap()), UNKNOWN_LENGTH);
    let body = &out[AU_HEADER_SIZE as usize..];
    assert!(body.iter().all(|&b| b as i8 == -64 || b as i8 == 86));
}

#[test]
fn test_au_16bit_is_big_endian() {
    let config = EncoderConfig::new(700, 11200, 16, ContainerKind::Au).unwrap();
    let encoder = CassetteEncoder::new(config).unwrap();
    let out = encoder.encode_to_vec(&CassetteName::stdin(), b"").unwrap();

    let body = &out[AU_HEADER_SIZE as usize..];
    // First half bit is low
    assert_eq!(&body[..2], &(-16515i16).to_be_bytes());
}

#[test]
fn test_streamed_text_matches_buffered_text() {
    let text = b"10 PRINT \"HELLO\"\r\n20 GOTO 10\n".repeat(40);
    let name = CassetteName::new("hello", "bas");

    let buffered = CassetteEncoder::new(
        EncoderConfig::new(700, 11200, 16, ContainerKind::Raw)
            .unwrap()
            .with_line_conversion(true),
    )
    .unwrap();
    let mut a = Vec::new();
    buffered.encode_buffered(&name, &text, &mut a).unwrap();

    let mut b = Vec::new();
    let summary = buffered.encode_streaming(&name, &text[..], &mut b).unwrap();
    assert_eq!(a, b);
    assert!(summary.input_bytes < text.len() as u64);

    let bytes = demodulate_bytes(&b, 2, 8);
    let blocks = split_blocks(&bytes);
    let first = &blocks[1].payload[3..];
    assert!(first.starts_with(b"10 PRINT \"HELLO\"\r20 GOTO 10\r10"));
    assert!(!first.contains(&b'\n'));
}

#[test]
fn test_forced_streaming_wav_uses_unknown_length() {
    let config = EncoderConfig::new(700, 11200, 16, ContainerKind::Wav)
        .unwrap()
        .with_streaming(true);
    let encoder = CassetteEncoder::new(config).unwrap();
    let mut out = Vec::new();
    let summary = encoder.encode(&CassetteName::stdin(), &b"data"[..], &mut out).unwrap();

    assert!(!summary.length_declared);
    assert_eq!(&out[4..8], &[0xFF; 4]);
    assert_eq!(&out[40..44], &[0xFF; 4]);
    assert_eq!(summary.bytes_written, out.len() as u64);
}
