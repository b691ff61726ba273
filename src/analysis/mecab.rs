//! MeCab-compatible morphological analysis channel.
//!
//! Opening a channel runs the analyzer three times:
//!
//! 1. `-D` to read the dictionary charset. Requests are encoded and output
//!    decoded in that charset; it must be ASCII-compatible (UTF-8, EUC-JP,
//!    Shift_JIS and the like).
//! 2. A calibration run printing the raw feature CSV of a known phrase, to
//!    find which feature columns hold the part of speech, the base form and
//!    the reading. Dictionaries disagree on the column order.
//! 3. The long-lived worker, configured to print
//!    `surface\x01form\x01base\x01reading` per token and `EOS` per line.

use encoding_rs::Encoding;
use log::debug;

use crate::analysis::kana::{is_kana_only, kata_to_hira};
use crate::analysis::morph::{COPULA, MorphToken, NOUN, VERB};
use crate::analysis::worker::{LineWorker, run_once};
use crate::error::{GlossaError, Result};

/// Phrase analyzed during calibration.
pub const CALIBRATION_PHRASE: &str = "守ります";

/// Base form expected in the calibration output.
const CALIBRATION_BASE: &str = "守る";

/// Reading expected in the calibration output (after kana normalization).
const CALIBRATION_READING: &str = "まもり";

/// Delimiter between output fields; cannot occur in ordinary text.
pub const FIELD_DELIMITER: char = '\u{1}';

/// Something that turns a line of text into morphological tokens.
pub trait MorphAnalyzer {
    /// Analyze one paragraph.
    fn parse(&mut self, text: &str) -> Result<Vec<MorphToken>>;

    /// Release the analyzer, reporting any shutdown error. Dropping an
    /// analyzer releases it as well.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Opens a fresh analyzer for each tokenize call.
pub trait AnalyzerFactory: Send + Sync {
    /// Start an analyzer. The caller closes it when the call is done.
    fn open(&self) -> Result<Box<dyn MorphAnalyzer>>;
}

/// Launches [`MorphAnalysisChannel`]s running an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MecabCommand {
    command: Vec<String>,
}

impl MecabCommand {
    /// `command` is the program followed by any leading arguments.
    pub fn new(command: Vec<String>) -> Self {
        MecabCommand { command }
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }
}

impl Default for MecabCommand {
    fn default() -> Self {
        MecabCommand::new(vec!["mecab".to_string()])
    }
}

impl AnalyzerFactory for MecabCommand {
    fn open(&self) -> Result<Box<dyn MorphAnalyzer>> {
        Ok(Box::new(MorphAnalysisChannel::open(&self.command)?))
    }
}

/// Feature columns holding the fields we need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    /// Part-of-speech column.
    pub form: usize,
    /// Base form column.
    pub base: usize,
    /// Reading column.
    pub reading: usize,
}

impl FieldLayout {
    /// Detect the layout from the feature CSV of the calibration phrase's
    /// first token.
    pub fn detect(features: &str) -> Result<Self> {
        let mut form = None;
        let mut base = None;
        let mut reading = None;

        for (idx, field) in features.split(',').enumerate() {
            if base.is_none() && field.contains(CALIBRATION_BASE) {
                base = Some(idx);
            }
            if reading.is_none() && kata_to_hira(field) == CALIBRATION_READING {
                reading = Some(idx);
            }
            if form.is_none() && field == VERB {
                form = Some(idx);
            }
        }

        match (form, base, reading) {
            (Some(form), Some(base), Some(reading)) => Ok(FieldLayout {
                form,
                base,
                reading,
            }),
            _ => Err(GlossaError::config(format!(
                "cannot locate part of speech, base form and reading in analyzer output {features:?}"
            ))),
        }
    }

    /// Analyzer arguments producing the delimited per-token format.
    pub fn output_args(&self) -> Vec<String> {
        let d = FIELD_DELIMITER;
        vec![
            "--eos-format=EOS\n".to_string(),
            format!(
                "--node-format=%m{d}%f[{}]{d}%f[{}]{d}%f[{}]\n",
                self.form, self.base, self.reading
            ),
            format!("--unk-format=%m{d}{d}{d}\n"),
        ]
    }
}

/// A running analyzer configured for this crate's line protocol.
///
/// Each tokenize call opens its own channel; the worker process is shut down
/// when the channel is closed or dropped, on every exit path.
#[derive(Debug)]
pub struct MorphAnalysisChannel {
    worker: LineWorker,
    layout: FieldLayout,
    encoding: &'static Encoding,
}

impl MorphAnalysisChannel {
    /// Read the charset, calibrate and start the analyzer. `command` is the program
    /// followed by any leading arguments.
    pub fn open(command: &[String]) -> Result<Self> {
        let (program, base_args) = split_command(command)?;

        let encoding = dictionary_charset(program, base_args)?;
        debug!("analyzer {program} uses charset {}", encoding.name());

        let layout = calibrate(program, base_args, encoding)?;
        debug!("analyzer field layout: {layout:?}");

        let mut args = base_args.to_vec();
        args.extend(layout.output_args());
        let worker = LineWorker::spawn(program, &args, encoding)?;

        Ok(MorphAnalysisChannel {
            worker,
            layout,
            encoding,
        })
    }

    /// The detected field layout.
    pub fn layout(&self) -> FieldLayout {
        self.layout
    }

    /// The analyzer's character encoding.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }
}

impl MorphAnalyzer for MorphAnalysisChannel {
    fn parse(&mut self, text: &str) -> Result<Vec<MorphToken>> {
        let lines = self.worker.request(&normalize_input(text))?;
        Ok(lines.iter().map(|line| parse_line(line)).collect())
    }

    fn close(&mut self) -> Result<()> {
        self.worker.shutdown()
    }
}

fn split_command(command: &[String]) -> Result<(&str, &[String])> {
    command
        .split_first()
        .map(|(program, args)| (program.as_str(), args))
        .ok_or_else(|| GlossaError::config("analyzer command is empty"))
}

/// Read the dictionary charset from `-D` output and resolve it to an
/// ASCII-compatible encoding.
pub fn dictionary_charset(program: &str, base_args: &[String]) -> Result<&'static Encoding> {
    let mut args = base_args.to_vec();
    args.push("-D".to_string());
    let out = run_once(program, &args, b"")?;

    let text = String::from_utf8_lossy(&out);
    let charset = text
        .lines()
        .find_map(|line| line.strip_prefix("charset:"))
        .map(|value| value.trim().to_string())
        .ok_or_else(|| GlossaError::config(format!("cannot determine {program} charset")))?;

    let encoding = Encoding::for_label(charset.as_bytes())
        .filter(|encoding| encoding.is_ascii_compatible())
        .ok_or_else(|| {
            GlossaError::config(format!("{program} dictionary charset {charset} is not supported"))
        })?;
    Ok(encoding)
}

/// Run the calibration phrase through the raw feature output.
pub fn calibrate(
    program: &str,
    base_args: &[String],
    encoding: &'static Encoding,
) -> Result<FieldLayout> {
    let mut args = base_args.to_vec();
    args.push("--node-format=%H\n".to_string());
    args.push("--unk-format=%H\n".to_string());

    let phrase = format!("{CALIBRATION_PHRASE}\n");
    let (input, _, _) = encoding.encode(&phrase);
    let out = run_once(program, &args, &input)?;
    let (text, _) = encoding.decode_without_bom_handling(&out);
    let first = text
        .lines()
        .next()
        .ok_or_else(|| GlossaError::config(format!("{program} printed nothing for calibration")))?;
    FieldLayout::detect(first)
}

/// Make `text` safe to send as one protocol line.
pub fn normalize_input(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' | '\r' => ' ',
            '\u{FF5E}' => '~',
            other => other,
        })
        .collect()
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.filter(|f| !f.is_empty())
}

/// Parse one delimited output line into a token.
pub fn parse_line(line: &str) -> MorphToken {
    let mut fields = line.split(FIELD_DELIMITER);
    let surface = fields.next().unwrap_or_default().to_string();
    let form = non_empty(fields.next()).map(str::to_string);

    let base = non_empty(fields.next()).map(|raw| {
        // Some dictionaries prefix the base form with a category and ':'.
        let base = raw.rsplit_once(':').map_or(raw, |(_, tail)| tail);
        match base.strip_suffix(COPULA) {
            Some(stem) if !stem.is_empty() && !surface.ends_with(COPULA) => stem.to_string(),
            _ => base.to_string(),
        }
    });
    let base = base.filter(|b| !b.is_empty());

    let reading = non_empty(fields.next()).map(kata_to_hira);

    let base_reading = match &base {
        Some(base) if is_kana_only(base) => Some(kata_to_hira(base)),
        _ if form.as_deref() == Some(NOUN) => reading.clone(),
        _ => None,
    };

    MorphToken {
        surface,
        form,
        base,
        reading,
        base_reading,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPADIC_FEATURES: &str = "動詞,自立,*,*,五段・ラ行,連用形,守る,マモリ,マモリ";
    const UNIDIC_FEATURES: &str = "動詞,一般,*,*,五段-ラ行,連用形-一般,マモル,守る,守り,マモリ,守る,マモル,和";

    #[test]
    fn test_detect_ipadic_layout() {
        let layout = FieldLayout::detect(IPADIC_FEATURES).unwrap();
        assert_eq!(
            layout,
            FieldLayout {
                form: 0,
                base: 6,
                reading: 7
            }
        );
    }

    #[test]
    fn test_detect_unidic_layout() {
        let layout = FieldLayout::detect(UNIDIC_FEATURES).unwrap();
        assert_eq!(layout.form, 0);
        assert_eq!(layout.base, 7);
        assert_eq!(layout.reading, 9);
    }

    #[test]
    fn test_detect_fails_without_all_fields() {
        assert!(FieldLayout::detect("名詞,一般,*,*,*,*,守り,マモリ,マモリ").is_err());
        assert!(FieldLayout::detect("").is_err());
    }

    #[test]
    fn test_output_args() {
        let layout = FieldLayout {
            form: 0,
            base: 6,
            reading: 7,
        };
        let args = layout.output_args();
        assert_eq!(args[0], "--eos-format=EOS\n");
        assert_eq!(args[1], "--node-format=%m\u{1}%f[0]\u{1}%f[6]\u{1}%f[7]\n");
        assert_eq!(args[2], "--unk-format=%m\u{1}\u{1}\u{1}\n");
    }

    #[test]
    fn test_normalize_input() {
        assert_eq!(normalize_input("一行目\n二行目"), "一行目 二行目");
        assert_eq!(normalize_input("十時～五時"), "十時~五時");
    }

    #[test]
    fn test_parse_verb_line() {
        let token = parse_line("守り\u{1}動詞\u{1}守る\u{1}マモリ");
        assert_eq!(token.surface, "守り");
        assert_eq!(token.form.as_deref(), Some("動詞"));
        assert_eq!(token.base.as_deref(), Some("守る"));
        assert_eq!(token.reading.as_deref(), Some("まもり"));
        assert_eq!(token.base_reading, None);
    }

    #[test]
    fn test_parse_noun_takes_reading_as_base_reading() {
        let token = parse_line("猫\u{1}名詞\u{1}猫\u{1}ネコ");
        assert_eq!(token.base_reading.as_deref(), Some("ねこ"));
    }

    #[test]
    fn test_parse_kana_base_reading() {
        let token = parse_line("テレビ\u{1}名詞\u{1}テレビ\u{1}テレビ");
        assert_eq!(token.base_reading.as_deref(), Some("てれび"));
    }

    #[test]
    fn test_parse_strips_category_prefix_and_copula() {
        let token = parse_line("静か\u{1}名詞\u{1}形状詞:静かだ\u{1}シズカ");
        assert_eq!(token.base.as_deref(), Some("静か"));

        let token = parse_line("静かだ\u{1}名詞\u{1}静かだ\u{1}シズカダ");
        assert_eq!(token.base.as_deref(), Some("静かだ"));

        let token = parse_line("で\u{1}助動詞\u{1}だ\u{1}デ");
        assert_eq!(token.base.as_deref(), Some("だ"));
    }

    #[test]
    fn test_parse_unknown_word() {
        let token = parse_line("ｘｙｚ\u{1}\u{1}\u{1}");
        assert_eq!(token, MorphToken::new("ｘｙｚ"));

        let token = parse_line("lonely");
        assert_eq!(token, MorphToken::new("lonely"));
    }

    #[cfg(unix)]
    mod channel {
        use super::*;
        use encoding_rs::{EUC_JP, UTF_8};
        use std::fs;
        use tempfile::TempDir;

        const FAKE_ANALYZER: &str = r#"
case "$1" in
  -D) printf 'filename:\tsys.dic\ncharset:\tUTF-8\n'; exit 0 ;;
  --node-format=%H*)
    read -r line
    printf '動詞,自立,*,*,五段・ラ行,連用形,守る,マモリ,マモリ\n助動詞,*,*,*,特殊・マス,基本形,ます,マス,マス\nEOS\n'
    exit 0 ;;
esac
while IFS= read -r line; do
  for w in $line; do
    case "$w" in
      bad) printf '\377\377\001x\n' ;;
      *) printf '%s\001名詞\001%s\001%s\n' "$w" "$w" "$w" ;;
    esac
  done
  echo EOS
done
"#;

        fn fake(dir: &TempDir, charset: &str) -> Vec<String> {
            let path = dir.path().join("fake-mecab.sh");
            let script = FAKE_ANALYZER.replace("UTF-8", charset);
            let encoding = Encoding::for_label(charset.as_bytes()).unwrap_or(UTF_8);
            let (bytes, _, _) = encoding.encode(&script);
            fs::write(&path, bytes).unwrap();
            vec!["sh".to_string(), path.to_string_lossy().into_owned()]
        }

        #[test]
        fn test_channel_round_trip() {
            let dir = TempDir::new().unwrap();
            let mut channel = MorphAnalysisChannel::open(&fake(&dir, "UTF-8")).unwrap();
            assert_eq!(channel.layout().base, 6);

            let tokens = channel.parse("ネコ が\nいる").unwrap();
            let surfaces: Vec<&str> = tokens.iter().map(|t| t.surface.as_str()).collect();
            assert_eq!(surfaces, vec!["ネコ", "が", "いる"]);
            assert_eq!(tokens[0].reading.as_deref(), Some("ねこ"));

            let tokens = channel.parse("二回目").unwrap();
            assert_eq!(tokens.len(), 1);
            channel.close().unwrap();
        }

        #[test]
        fn test_channel_speaks_analyzer_charset() {
            let dir = TempDir::new().unwrap();
            let mut channel = MorphAnalysisChannel::open(&fake(&dir, "EUC-JP")).unwrap();
            assert_eq!(channel.encoding(), EUC_JP);
            assert_eq!(channel.layout().base, 6);

            let tokens = channel.parse("ネコ bad が").unwrap();
            let surfaces: Vec<&str> = tokens.iter().map(|t| t.surface.as_str()).collect();
            assert_eq!(surfaces, vec!["ネコ", "が"]);
            assert_eq!(tokens[0].form.as_deref(), Some(NOUN));
            assert_eq!(tokens[0].reading.as_deref(), Some("ねこ"));
            channel.close().unwrap();
        }

        #[test]
        fn test_undecodable_output_is_skipped() {
            let dir = TempDir::new().unwrap();
            let mut channel = MorphAnalysisChannel::open(&fake(&dir, "UTF-8")).unwrap();
            assert_eq!(channel.encoding(), UTF_8);
            assert_eq!(channel.parse("a bad b").unwrap().len(), 2);
        }

        #[test]
        fn test_channel_rejects_unknown_charsets() {
            let dir = TempDir::new().unwrap();
            let err = MorphAnalysisChannel::open(&fake(&dir, "KLINGON")).unwrap_err();
            assert!(matches!(err, GlossaError::Config(_)));

            let err = MorphAnalysisChannel::open(&fake(&dir, "UTF-16")).unwrap_err();
            assert!(matches!(err, GlossaError::Config(_)));
        }

        #[test]
        fn test_factory_opens_independent_channels() {
            let dir = TempDir::new().unwrap();
            let factory = MecabCommand::new(fake(&dir, "UTF-8"));
            let mut first = factory.open().unwrap();
            let mut second = factory.open().unwrap();
            assert_eq!(first.parse("a b").unwrap().len(), 2);
            assert_eq!(second.parse("c").unwrap().len(), 1);
            first.close().unwrap();
            assert!(first.parse("d").is_err());
            assert_eq!(second.parse("e f g").unwrap().len(), 3);
        }

        #[test]
        fn test_missing_analyzer() {
            let err = MorphAnalysisChannel::open(&["glossa-no-such-mecab".to_string()]).unwrap_err();
            assert!(matches!(err, GlossaError::Config(_)));
        }
    }
}
