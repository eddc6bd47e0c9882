#![allow(clippy::uninlined_format_args)]

use chrono::Utc;
use streamjack_detector::detector::Candidate;
use streamjack_detector::{
    ChannelMetadata, DetectorConfig, Lexicon, StreamJackingDetector, VideoMetadata,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Scoring a hijacked-channel scam stream and a legitimate news stream...");

    // Partial YAML: everything not named keeps its default
    let config_yaml = r#"
scoring:
  composite:
    detection_threshold: 30.0
"#;

    let config: DetectorConfig = serde_yaml::from_str(config_yaml)?;
    config.validate()?;
    let lexicon = Lexicon::compile(&config.lexicon)?;
    let detector = StreamJackingDetector::new(&lexicon, &config.scoring);

    // A gaming channel taken over and renamed to impersonate Tesla
    let scam = Candidate {
        video: VideoMetadata {
            video_id: "dQw4w9WgXcQ".to_string(),
            title: "Tеsla Official Crypto Giveaway LIVE - Double your BTC".to_string(),
            description: "Send BTC to bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh and receive double back! \
                          Limited time, act now. More info: bit.ly/tesla-bonus"
                .to_string(),
            channel_id: "UCgamer0000000000000000".to_string(),
            channel_title: "Tesla Official".to_string(),
            is_live: true,
            view_count: 48_000,
            comment_count: 0,
            comments_disabled: true,
            ..Default::default()
        },
        channel: Some(ChannelMetadata {
            channel_id: "UCgamer0000000000000000".to_string(),
            channel_title: "Tesla Official".to_string(),
            custom_handle: Some("@progamer99".to_string()),
            description: "Official crypto bitcoin ethereum giveaway channel".to_string(),
            subscriber_count: 120_000,
            video_count: 3,
            published_at: "2015-04-12T09:30:00Z".to_string(),
            topic_categories: vec!["https://en.wikipedia.org/wiki/Video_game_culture".to_string()],
            ..Default::default()
        }),
        search_query: Some("tesla crypto live".to_string()),
    };

    // A whitelisted broadcaster covering the same topic
    let news = Candidate {
        video: VideoMetadata {
            video_id: "n3wsBr0adc4".to_string(),
            title: "Bitcoin price analysis: market news and expert interview".to_string(),
            description: "Our analysts discuss regulation and the week in crypto markets".to_string(),
            channel_id: "UCvJJ_dzjViJCoLf5uKUTwoA".to_string(),
            channel_title: "CNBC".to_string(),
            is_live: true,
            view_count: 15_000,
            comment_count: 420,
            ..Default::default()
        },
        channel: Some(ChannelMetadata {
            channel_id: "UCvJJ_dzjViJCoLf5uKUTwoA".to_string(),
            channel_title: "CNBC".to_string(),
            custom_handle: Some("@cnbc".to_string()),
            subscriber_count: 5_000_000,
            video_count: 40_000,
            published_at: "2006-12-01T00:00:00Z".to_string(),
            ..Default::default()
        }),
        search_query: Some("bitcoin live".to_string()),
    };

    let now = Utc::now();
    for candidate in [&scam, &news] {
        let record = detector.evaluate(candidate, now)?;

        println!();
        println!("🎬 {}", record.video_title);
        println!("   Channel: {} ({})", record.channel_title, record.channel_url);
        println!(
            "   Result: {} (score {:.1}, confidence {:.2}, critical checks {}/5)",
            record.risk_category,
            record.total_risk_score,
            record.confidence_score,
            record.critical_checks_passed
        );
        println!("   Video score: {:.1}", record.video_risk_score);
        for signal in &record.video_signals {
            println!("     • {}", signal);
        }
        println!("   Channel score: {:.1}", record.channel_risk_score);
        for signal in &record.channel_signals {
            println!("     • {}", signal);
        }
    }

    Ok(())
}
