//! Background worker that owns the session and the AI clients.
//!
//! The UI thread sends [`Intent`]s and renders [`Update`]s; generation
//! jobs run on spawned tasks so navigation never waits on the network.
//! Completions come back tagged with the card id they belong to, so a
//! late image still lands on the right card.

use tales_core::{
    run_image_job, run_story_job, AiError, CardDraft, DeckFile, HttpFetcher, ImageJob, Notice,
    Session, Snapshot, StoryError, StoryJob, Storyteller,
};
use tokio::sync::mpsc;

/// User intent raised by the view.
#[derive(Debug)]
pub enum Intent {
    Advance,
    Shuffle,
    AddCard(CardDraft),
    RequestStory,
}

/// State pushed to the view after every session change.
#[derive(Debug)]
pub struct Update {
    pub snapshot: Snapshot,
    pub notices: Vec<Notice>,
}

enum Completion {
    Image {
        card_id: String,
        result: Result<String, AiError>,
    },
    Story(Result<String, StoryError>),
}

/// Run the worker until the intent channel closes.
pub async fn run(
    store: DeckFile,
    ai: Storyteller,
    fetcher: HttpFetcher,
    mut intents: mpsc::Receiver<Intent>,
    updates: mpsc::Sender<Update>,
) {
    let (done_tx, mut done_rx) = mpsc::channel::<Completion>(8);

    let (mut session, job) = Session::init(store).await;
    if let Some(job) = job {
        spawn_image(job, ai.clone(), done_tx.clone());
    }
    push_update(&mut session, &updates).await;

    loop {
        tokio::select! {
            intent = intents.recv() => {
                let Some(intent) = intent else { break };
                match intent {
                    Intent::Advance => {
                        if let Some(job) = session.advance().await {
                            spawn_image(job, ai.clone(), done_tx.clone());
                        }
                    }
                    Intent::Shuffle => {
                        if let Some(job) = session.shuffle().await {
                            spawn_image(job, ai.clone(), done_tx.clone());
                        }
                    }
                    Intent::AddCard(draft) => {
                        if let Ok(Some(job)) = session.add_card(draft).await {
                            spawn_image(job, ai.clone(), done_tx.clone());
                        }
                    }
                    Intent::RequestStory => {
                        if let Some(job) = session.begin_story() {
                            spawn_story(job, ai.clone(), fetcher.clone(), done_tx.clone());
                        }
                    }
                }
                push_update(&mut session, &updates).await;
            }
            done = done_rx.recv() => {
                match done {
                    Some(Completion::Image { card_id, result }) => {
                        if let Some(job) = session.complete_image(&card_id, result).await {
                            spawn_image(job, ai.clone(), done_tx.clone());
                        }
                    }
                    Some(Completion::Story(result)) => {
                        session.complete_story(result);
                    }
                    None => break,
                }
                push_update(&mut session, &updates).await;
            }
        }
    }
}

fn spawn_image(job: ImageJob, ai: Storyteller, tx: mpsc::Sender<Completion>) {
    tokio::spawn(async move {
        let result = run_image_job(&job, &ai).await;
        let _ = tx
            .send(Completion::Image {
                card_id: job.card_id,
                result,
            })
            .await;
    });
}

fn spawn_story(job: StoryJob, ai: Storyteller, fetcher: HttpFetcher, tx: mpsc::Sender<Completion>) {
    tokio::spawn(async move {
        let result = run_story_job(&job, &ai, &fetcher).await;
        let _ = tx.send(Completion::Story(result)).await;
    });
}

async fn push_update(session: &mut Session, updates: &mpsc::Sender<Update>) {
    let update = Update {
        snapshot: session.snapshot(),
        notices: session.drain_notices(),
    };
    let _ = updates.send(update).await;
}
