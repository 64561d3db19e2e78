use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use beacon_sight::language_select::LanguageSelector;
use beacon_sight::narration::{OpenAiCommentary, TranslationTable};
use beacon_sight::vision::{FfmpegSource, HttpDetector, TracingDisplay};
use beacon_sight::voice::{
    AudioCapture, AudioPlayback, CloudVoice, MicrophoneRecognizer, SpeechOutputRouter,
    SpeechRecognizer, SpeechSynthesizer, SpeechToText, SttProvider, TextToSpeech, TtsProvider,
    calculate_energy,
};
use beacon_sight::{
    CommandDispatcher, Collaborators, Config, FrameProcessingLoop, Language, Session,
    TerminalInput, UtteranceKind, VoiceCommandListener,
};

/// Timeout for TTS and STT requests
const VOICE_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sight - Spoken scene narration for smart glasses
#[derive(Parser)]
#[command(name = "sight", version, about)]
struct Cli {
    /// Videos to narrate, in order (defaults to the configured list)
    videos: Vec<PathBuf>,

    /// Config file (defaults to ~/.config/omni/sight/config.toml)
    #[arg(short, long, env = "SIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Start in this language instead of asking (english, tamil)
    #[arg(short, long, env = "SIGHT_LANGUAGE")]
    language: Option<Language>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
        /// Voice to use
        #[arg(short, long, default_value = "english")]
        language: Language,
    },
    /// Listen once and print the transcript
    Listen {
        /// Seconds to wait for speech
        #[arg(short, long, default_value = "5")]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,beacon_sight=info",
        1 => "info,beacon_sight=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text, language } => {
                test_tts(cli.config.as_deref(), &text, language).await
            }
            Command::Listen { timeout } => listen_once(cli.config.as_deref(), timeout).await,
        };
    }

    let config = Config::load(cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    let videos = if cli.videos.is_empty() {
        config.videos.clone()
    } else {
        cli.videos
    };

    tracing::info!(videos = videos.len(), detector = %config.detector.url, "starting sight");

    // Startup preconditions: detector and decoder must be available
    let detector = HttpDetector::connect(&config.detector.url, config.detector.timeout).await?;
    let source = FfmpegSource::new()?;

    let commentary = OpenAiCommentary::new(
        copy_secret(&config.api_keys.openai),
        config.commentary.model.clone(),
        config.commentary.timeout,
    )?
    .with_sampling(config.commentary.temperature, config.commentary.max_tokens);

    let playback = AudioPlayback::new()?;
    let session = Session::new(Language::default());
    let mut router = SpeechOutputRouter::new(session.clone());
    for language in Language::ALL {
        router = router.with_engine(language, build_voice(&config, language, playback.clone())?);
    }
    let router = Arc::new(router);

    let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(build_recognizer(&config)?);

    let language = match cli.language.or(config.language) {
        Some(language) => language,
        None => {
            let mut input = TerminalInput;
            LanguageSelector::new(&router, recognizer.as_ref(), &mut input)
                .listen_timeout(config.listener.listen_timeout)
                .max_manual_attempts(config.listener.manual_attempts)
                .resolve()
                .await
        }
    };
    session.set_language(language);
    tracing::info!(%language, "narration language");

    let (stop_tx, stop_rx) = watch::channel(false);
    let listener = VoiceCommandListener::new(
        Arc::clone(&recognizer),
        CommandDispatcher::new(session.clone(), Arc::clone(&router)),
        config.listener.listen_timeout,
    )
    .spawn(stop_rx.clone());

    let ctrl_c_tx = stop_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping");
            let _ = ctrl_c_tx.send(true);
        }
    });

    let frame_loop = FrameProcessingLoop::new(
        Collaborators {
            source: Arc::new(source),
            detector: Arc::new(detector),
            commentary: Arc::new(commentary),
            speech: Arc::clone(&router),
            display: Box::new(TracingDisplay),
        },
        TranslationTable::builtin().with_overrides(&config.translations),
        config.narration.clone(),
    );

    let summary = frame_loop.run(&videos, &stop_rx).await;

    // The listener may be mid-listen; signal it and let it go
    let _ = stop_tx.send(true);
    drop(listener);

    tracing::info!(
        completed = summary.videos_completed,
        skipped = summary.videos_skipped,
        quit = summary.quit,
        "sight finished"
    );

    Ok(())
}

fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

/// Build the TTS engine configured for a language
fn build_voice(
    config: &Config,
    language: Language,
    playback: AudioPlayback,
) -> anyhow::Result<Arc<dyn SpeechSynthesizer>> {
    let settings = config.voice(language);
    let api_key = match settings.provider {
        TtsProvider::OpenAI => copy_secret(&config.api_keys.openai),
        TtsProvider::ElevenLabs => config
            .api_keys
            .elevenlabs
            .as_ref()
            .map(copy_secret)
            .ok_or_else(|| {
                anyhow::anyhow!("ELEVENLABS_API_KEY required for the {language} voice")
            })?,
    };

    let tts = TextToSpeech::new(settings, api_key, VOICE_REQUEST_TIMEOUT)?;
    Ok(Arc::new(CloudVoice::new(tts, playback)))
}

/// Build the microphone recognizer with the configured STT backend
fn build_recognizer(config: &Config) -> anyhow::Result<MicrophoneRecognizer> {
    let api_key = match config.listener.stt_provider {
        SttProvider::Whisper => copy_secret(&config.api_keys.openai),
        SttProvider::Deepgram => config
            .api_keys
            .deepgram
            .as_ref()
            .map(copy_secret)
            .ok_or_else(|| anyhow::anyhow!("DEEPGRAM_API_KEY required for Deepgram STT"))?,
    };

    let stt = SpeechToText::new(
        config.listener.stt_provider,
        api_key,
        config.listener.stt_model.clone(),
        VOICE_REQUEST_TIMEOUT,
    )?;
    Ok(MicrophoneRecognizer::new(stt))
}

/// Test microphone input
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    // The capture stream is not Send; keep it on one blocking thread
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut capture = AudioCapture::new()?;
        capture.start()?;

        println!("Sample rate: {} Hz", capture.sample_rate());
        println!("---");

        for i in 0..duration {
            std::thread::sleep(Duration::from_secs(1));

            let samples = capture.take_buffer();
            let energy = calculate_energy(&samples);
            let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

            // Visual meter
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let meter_len = (energy * 100.0).min(50.0) as usize;
            let meter: String = "█".repeat(meter_len) + &" ".repeat(50 - meter_len);

            println!(
                "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
                i + 1,
                energy,
                peak,
                meter
            );
        }

        capture.stop();
        Ok(())
    })
    .await??;

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let sample_rate = beacon_sight::voice::PLAYBACK_SAMPLE_RATE;
    let frequency = 440.0_f32;
    #[allow(clippy::cast_precision_loss)]
    let rate = sample_rate as f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (rate * 2.0) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / rate;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {} samples at {} Hz...", samples.len(), sample_rate);

    tokio::task::spawn_blocking(move || playback.play_blocking(samples)).await??;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Try: pavucontrol (to check output levels)");

    Ok(())
}

/// Speak text through the voice configured for a language
async fn test_tts(
    config_path: Option<&std::path::Path>,
    text: &str,
    language: Language,
) -> anyhow::Result<()> {
    println!("Testing {language} TTS with text: \"{text}\"\n");

    let config = Config::load(config_path)?;
    let voice = build_voice(&config, language, AudioPlayback::new()?)?;

    let router = SpeechOutputRouter::new(Session::new(language)).with_engine(language, voice);
    if !router.speak(text, language, UtteranceKind::System).await {
        anyhow::bail!("TTS failed, see log for details");
    }

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}

/// One bounded recognition attempt
async fn listen_once(config_path: Option<&std::path::Path>, timeout: u64) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    let recognizer = build_recognizer(&config)?;

    println!("Listening for {timeout} seconds...");
    match recognizer.listen(Duration::from_secs(timeout)).await {
        Ok(transcript) => println!("Heard: \"{transcript}\""),
        Err(e) if e.is_recognition_miss() => println!("Nothing usable heard ({e})"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
