use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use crate::entry::Entry;

/// Item da fila de expiração: (instante, token).
/// Ordenado por instante para purga eficiente.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub(crate) struct Deadline(pub Instant, pub String);

/// Background task que remove mensagens vencidas e não lidas.
///
/// Recebe prazos pelo canal e dorme até o mais próximo. Termina quando o
/// último `MessageStore` é dropado e o canal fecha.
pub(crate) async fn run(
    data: Arc<DashMap<String, Entry>>,
    mut rx: mpsc::UnboundedReceiver<Deadline>,
) {
    let mut queue: BTreeSet<Deadline> = BTreeSet::new();

    loop {
        let next = queue.first().map(|d| d.0);

        let received = match next {
            Some(when) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(when) => None,
                    received = rx.recv() => Some(received),
                }
            }
            None => Some(rx.recv().await),
        };

        match received {
            Some(Some(deadline)) => {
                queue.insert(deadline);
                continue;
            }
            Some(None) => break,
            None => {}
        }

        let now = Instant::now();
        while let Some(deadline) = queue.pop_first() {
            if deadline.0 > now {
                queue.insert(deadline);
                break;
            }
            // Pode já ter sido lida: só remove se ainda existe e venceu
            if data
                .remove_if(&deadline.1, |_, entry| entry.is_expired_at(now))
                .is_some()
            {
                debug!("mensagem {} expirou e foi removida", deadline.1);
            }
        }
    }

    debug!("sweeper encerrado ({} prazos pendentes)", queue.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    fn spawn_sweeper() -> (Arc<DashMap<String, Entry>>, mpsc::UnboundedSender<Deadline>) {
        let data = Arc::new(DashMap::new());
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(data.clone(), rx));
        (data, tx)
    }

    #[tokio::test]
    async fn removes_entry_after_deadline() {
        let (data, tx) = spawn_sweeper();
        let at = Instant::now() + Duration::from_millis(50);
        data.insert("t1".to_string(), Entry::new("x".into(), Some(at)));
        tx.send(Deadline(at, "t1".into())).unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(data.contains_key("t1"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!data.contains_key("t1"));
    }

    #[tokio::test]
    async fn earlier_deadline_arriving_later_still_fires_first() {
        let (data, tx) = spawn_sweeper();
        let late = Instant::now() + Duration::from_secs(60);
        let soon = Instant::now() + Duration::from_millis(30);
        data.insert("late".to_string(), Entry::new("x".into(), Some(late)));
        data.insert("soon".to_string(), Entry::new("y".into(), Some(soon)));
        tx.send(Deadline(late, "late".into())).unwrap();
        tx.send(Deadline(soon, "soon".into())).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!data.contains_key("soon"));
        assert!(data.contains_key("late"));
    }

    #[tokio::test]
    async fn missing_entry_is_a_noop() {
        let (data, tx) = spawn_sweeper();
        let at = Instant::now() + Duration::from_millis(10);
        tx.send(Deadline(at, "gone".into())).unwrap();
        data.insert("other".to_string(), Entry::new("z".into(), None));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(data.len(), 1);
    }

    #[tokio::test]
    async fn exits_when_channel_closes() {
        let data = Arc::new(DashMap::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(data, rx));
        drop(tx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
